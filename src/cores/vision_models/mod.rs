pub mod vision_controller;
pub mod openai;
