pub mod file_change_bus;
