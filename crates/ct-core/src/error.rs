use std::fmt::{self, Debug, Display};

/// The error taxonomy of the engine (spec §7): each variant is a distinct
/// process-exit-code bucket so operators can tell a bad geometry from a
/// dead accelerator from a full disk without parsing log text.
#[derive(Clone)]
pub enum Error {
	/// Invalid geometry, impossible ROI, no accelerators present, unsupported
	/// device capability. Always surfaces before any task runs.
	Construction(String),
	/// Device out of memory once the pool is already at its `limit`.
	Allocation(String),
	/// An asynchronous accelerator error detected at the next synchronization,
	/// or any other failure while a pipeline is running.
	Runtime(String),
	/// Reported by the projection/volume I/O collaborator.
	Io(String),
	/// A programming invariant was violated; always a bug, never a user error.
	InvalidArgument(String),
}

impl Error {
	pub fn construction(msg: impl Into<String>) -> Self { Error::Construction(msg.into()) }

	pub fn allocation(msg: impl Into<String>) -> Self { Error::Allocation(msg.into()) }

	pub fn runtime(msg: impl Into<String>) -> Self { Error::Runtime(msg.into()) }

	pub fn io(msg: impl Into<String>) -> Self { Error::Io(msg.into()) }

	pub fn invalid_argument(msg: impl Into<String>) -> Self { Error::InvalidArgument(msg.into()) }

	/// Process exit code per spec §6/§7: 0 is reserved for success and never
	/// produced here.
	pub fn exit_code(&self) -> i32 {
		match self {
			Error::Construction(_) => 2,
			Error::Allocation(_) => 3,
			Error::Runtime(_) => 4,
			Error::Io(_) => 5,
			Error::InvalidArgument(_) => 70,
		}
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::Construction(msg) => write!(f, "construction failure: {msg}"),
			Error::Allocation(msg) => write!(f, "allocation failure: {msg}"),
			Error::Runtime(msg) => write!(f, "runtime failure: {msg}"),
			Error::Io(msg) => write!(f, "i/o failure: {msg}"),
			Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
		}
	}
}

impl Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { <Self as Display>::fmt(self, f) }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self { Error::Io(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
