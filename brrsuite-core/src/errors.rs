// BRR Suite
// Copyright (c) 2022-2025 The BRR Suite Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

use crate::common::DataIssue;

/// `Error` provides an enumeration of all possible errors reported by BRR Suite.
#[derive(Debug)]
pub enum Error {
    /// An IO error occurred while reading or writing a stream.
    IoError(std::io::Error),
    /// An argument passed at the API boundary is outside its documented domain.
    InvalidArgument(&'static str),
    /// A byte stream is malformed and could not be parsed.
    BadFormat(&'static str),
    /// A byte stream parsed, but validation found issues that cannot be repaired.
    Unresolvable(DataIssue),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => {
                write!(f, "io error: {}", err)
            }
            Error::InvalidArgument(msg) => {
                write!(f, "invalid argument: {}", msg)
            }
            Error::BadFormat(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Error::Unresolvable(issues) => {
                write!(f, "unresolvable data issues: {:?}", issues)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an invalid argument error.
pub fn invalid_argument_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::InvalidArgument(msg))
}

/// Convenience function to create a bad format error.
pub fn bad_format_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::BadFormat(msg))
}

/// Convenience function to create an unresolvable data error.
pub fn unresolvable_error<T>(issues: DataIssue) -> Result<T> {
    Err(Error::Unresolvable(issues))
}
