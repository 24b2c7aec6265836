pub mod admin;
pub mod event_page;
pub mod guest_upload;
pub mod stored_file;
