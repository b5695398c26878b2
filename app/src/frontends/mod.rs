pub mod homekit;
