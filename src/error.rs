//! Error types for the ESP32 I2S expander
//!
//! Errors are organized by domain:
//! - [`ConfigError`]: Initialization and configuration failures
//! - [`StateError`]: Lifecycle operations issued in the wrong state
//!
//! The unified [`Error`] enum wraps both and is returned by the
//! lifecycle methods.
//!
//! Two conditions are not errors. A rejected
//! sample push is reported as a zero count by
//! [`PulseWriter::push_samples`](crate::PulseWriter::push_samples), and a
//! fill task that falls behind the DMA engine is absorbed by the interrupt
//! handler and only shows up in
//! [`I2sExpander::underflow_count`](crate::I2sExpander::underflow_count).

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and initialization errors
///
/// These errors occur during [`init`](crate::I2sExpander::init) and are
/// fatal to that call. The instance stays uninitialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Expander already initialized
    AlreadyInitialized,
    /// Sample buffers or descriptors are not in DMA-capable memory
    DmaMemoryUnavailable,
    /// Buffer geometry exceeds the DMA limit or leaves no room past the safety margin
    InvalidBufferLength,
    /// Sample period cannot be produced by the I2S clock dividers
    InvalidClock,
    /// WS, BCK and DATA must be three distinct output-capable pins
    InvalidPin,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::DmaMemoryUnavailable => "DMA-capable memory unavailable",
            ConfigError::InvalidBufferLength => "invalid DMA buffer length",
            ConfigError::InvalidClock => "unsupported sample period",
            ConfigError::InvalidPin => "invalid signal pin assignment",
        }
    }
}

// =============================================================================
// State Errors
// =============================================================================

/// Lifecycle state errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateError {
    /// Operation requires a successful `init` first
    NotInitialized,
}

impl core::fmt::Display for StateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StateError::NotInitialized => "not initialized",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match EXPANDER.reset() {
///     Err(Error::State(StateError::NotInitialized)) => { /* call init first */ }
///     Err(Error::Config(e)) => { /* ... */ }
///     Ok(()) => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Lifecycle state error
    State(StateError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::State(e) => write!(f, "state: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Error::State(e)
    }
}

/// Result type alias for expander operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for lifecycle state checks
pub type StateResult<T> = core::result::Result<T, StateError>;

// =============================================================================
// Unit Tests
// =============================================================================
