pub mod audio;
pub mod config;
pub mod error;
pub mod kernel;
pub mod sections;
pub mod services;
pub mod session;
pub mod speech;

pub use config::Config;
pub use error::{Error, Result};
pub use kernel::reactor::{Reactor, ReactorConfig};
pub use session::{Session, SessionCommand, SessionHandle};
