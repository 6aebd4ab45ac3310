pub mod coordinate_input;
pub mod handlers;
pub mod header;
pub mod results;
pub mod tile_preview;
pub mod upload_section;
pub mod utils;
