pub mod config_cmd;
pub mod doctor;
pub mod probe;
pub mod simulate;
