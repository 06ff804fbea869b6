//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                     | Connects to             |
//! |---------------|--------------------------------|-------------------------|
//! | `hardware`    | PinController, IndicatorPort,  | rppal GPIO / simulation |
//! |               | SolenoidPort (via drivers)     |                         |
//! | `log_sink`    | EventSink                      | `log` facade            |
//! | `json_store`  | PersistencePort                | JSON-lines files        |
//! | `config_file` | ConfigPort                     | JSON config document    |

pub mod config_file;
pub mod hardware;
pub mod json_store;
pub mod log_sink;
