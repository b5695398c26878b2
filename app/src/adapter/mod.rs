pub mod esp_window;
