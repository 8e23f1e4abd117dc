pub mod draft;
pub mod scan;
pub mod subtitles;
pub mod validate;
