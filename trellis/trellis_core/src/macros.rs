//! Convenience macros for the Trellis substrate.

/// Log an event with the given level and module.
///
/// Key/value pairs after the message are appended as `key=value` metadata.
///
/// # Examples
///
/// ```
/// use trellis_core::log_event;
/// use trellis_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "Resource graph sealed");
///
/// log_event!(LogLevel::Debug, "Resolved behavior",
///     type_key => "Dog",
///     contributions => 2,
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr) => {
        {
            use $crate::utils::LogLevel;
            match $level {
                LogLevel::Error => log::error!("[{}] {}", module_path!(), $message),
                LogLevel::Warning => log::warn!("[{}] {}", module_path!(), $message),
                LogLevel::Info => log::info!("[{}] {}", module_path!(), $message),
                LogLevel::Debug => log::debug!("[{}] {}", module_path!(), $message),
                LogLevel::Trace => log::trace!("[{}] {}", module_path!(), $message),
            }
        }
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        {
            use $crate::utils::LogLevel;
            let metadata = vec![$(format!("{}={}", stringify!($key), $value)),+].join(" ");
            match $level {
                LogLevel::Error => log::error!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Warning => log::warn!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Info => log::info!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Debug => log::debug!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Trace => log::trace!("[{}] {}: {}", module_path!(), $message, metadata),
            }
        }
    };
}

/// Return early with a configuration error.
///
/// # Examples
///
/// ```
/// use trellis_core::{config_bail, error::ConfigurationError, id::TypeKey, Result};
///
/// fn check(reachable: bool) -> Result<()> {
///     if !reachable {
///         config_bail!(ConfigurationError::UnreachableType(TypeKey::new("Orphan")));
///     }
///     Ok(())
/// }
///
/// assert!(check(false).is_err());
/// ```
#[macro_export]
macro_rules! config_bail {
    ($error:expr) => {{
        let error: $crate::error::ConfigurationError = $error;
        log::error!("[{}] {}", module_path!(), error);
        return Err(error.into());
    }};
}
