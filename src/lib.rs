pub mod chem;
pub mod command_line;
pub mod config;
pub mod enumeration;
pub mod inputs;
pub mod output;
