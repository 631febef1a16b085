pub mod api_utils;
pub mod components;
pub mod config;
pub mod dialogs;
pub mod icons;
pub mod modal_frame;
pub mod modal_stack;
pub mod security;
pub mod wizard;
