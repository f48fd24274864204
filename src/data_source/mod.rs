mod local_source;
mod remote_source;
mod source_interface;

pub use local_source::make_local_source;
pub use remote_source::make_remote_source;
pub use source_interface::DataSource;
