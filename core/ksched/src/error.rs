// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Error codes reported by the scheduling core.
//!
//! Only recoverable misuse surfaces here. Broken scheduler invariants (a
//! thread waiting twice, a waiting thread acquiring another queue) are kernel
//! bugs and panic instead.

use core::fmt;

use strum::EnumCount;

/// The error kind type used by the scheduler.
#[repr(i32)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, EnumCount)]
pub enum SchedError {
    /// Bad internal state.
    BadState = 1,
    /// Invalid parameter/argument.
    InvalidInput,
    /// The requested thread or queue is not known to the scheduler.
    NotFound,
    /// A priority lies outside the policy's legal range.
    OutOfRange,
    /// The resource is owned by another thread.
    ResourceBusy,
}

impl SchedError {
    /// Returns the error description.
    pub fn as_str(&self) -> &'static str {
        use SchedError::*;
        match *self {
            BadState => "Bad internal state",
            InvalidInput => "Invalid input parameter",
            NotFound => "Entity not found",
            OutOfRange => "Priority out of range",
            ResourceBusy => "Resource busy",
        }
    }

    /// Returns the error code value in `i32`.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for SchedError {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        use SchedError::*;
        Ok(match value {
            1 => BadState,
            2 => InvalidInput,
            3 => NotFound,
            4 => OutOfRange,
            5 => ResourceBusy,
            _ => return Err(value),
        })
    }
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A specialized [`Result`] type with [`SchedError`] as the error type.
pub type SchedResult<T = ()> = Result<T, SchedError>;

/// Constructs a [`SchedError`] while printing a warning message.
///
/// ```
/// # use ksched::{sched_err_type, SchedError};
/// assert_eq!(sched_err_type!(OutOfRange), SchedError::OutOfRange);
/// assert_eq!(
///     sched_err_type!(InvalidInput, "min above max"),
///     SchedError::InvalidInput,
/// );
/// ```
#[macro_export]
macro_rules! sched_err_type {
    ($err:ident) => {{
        let err = $crate::SchedError::$err;
        $crate::__priv::warn!("[SchedError::{:?}]", err);
        err
    }};
    ($err:ident, $msg:expr) => {{
        let err = $crate::SchedError::$err;
        $crate::__priv::warn!("[SchedError::{:?}] {}", err, $msg);
        err
    }};
}

/// Constructs an [`Err(SchedError)`](Err) while printing a warning message.
///
/// ```
/// # use ksched::{sched_err, SchedError, SchedResult};
/// assert_eq!(
///     sched_err!(NotFound, "queue 3"),
///     SchedResult::<()>::Err(SchedError::NotFound),
/// );
/// ```
#[macro_export]
macro_rules! sched_err {
    ($err:ident) => {
        Err($crate::sched_err_type!($err))
    };
    ($err:ident, $msg:expr) => {
        Err($crate::sched_err_type!($err, $msg))
    };
}

/// Returns early with a [`SchedError`], optionally with a message.
#[macro_export]
macro_rules! sched_bail {
    ($($t:tt)*) => {
        return $crate::sched_err!($($t)*);
    };
}

#[cfg(test)]
mod tests {
    use strum::EnumCount;

    use super::SchedError;

    #[test]
    fn test_try_from() {
        let max_code = SchedError::COUNT as i32;
        assert_eq!(max_code, 5);
        assert_eq!(max_code, SchedError::ResourceBusy.code());

        assert_eq!(SchedError::BadState.code(), 1);
        assert_eq!(Ok(SchedError::BadState), SchedError::try_from(1));
        assert_eq!(Ok(SchedError::OutOfRange), SchedError::try_from(4));
        assert_eq!(Err(max_code + 1), SchedError::try_from(max_code + 1));
        assert_eq!(Err(0), SchedError::try_from(0));
        assert_eq!(Err(-1), SchedError::try_from(-1));
    }

    #[test]
    fn test_codes_round_trip_through_description() {
        for code in 1..=SchedError::COUNT as i32 {
            let err = SchedError::try_from(code).unwrap();
            assert_eq!(err.code(), code);
            assert!(!err.as_str().is_empty());
        }
    }
}
