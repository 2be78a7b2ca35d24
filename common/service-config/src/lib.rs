//! Named settings bound to command-line flags, environment variables and typed defaults.
//!
//! ```
//! use service_config::{Entry, Provider};
//!
//! let mut provider = Provider::new(
//!     "my-service",
//!     vec![Entry::new("port", "p", "The port of the service", 8080)],
//!     Some("MY_SERVICE"),
//! )
//! .unwrap();
//! provider.read_args(["my-service", "--port", "3000"]).unwrap();
//! assert_eq!(provider.get_int("port").unwrap(), 3000);
//! ```

mod entry;
mod error;
mod provider;

pub use entry::{Entry, Value};
pub use error::ConfigError;
pub use provider::Provider;
