pub mod count;
pub mod enumerate;

pub mod prelude {
    pub use clap::{Arg, ArgAction, ArgMatches, Command};
}
