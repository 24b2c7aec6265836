pub mod links;
pub mod upload;

pub use links::LinkService;
pub use upload::UploadService;
