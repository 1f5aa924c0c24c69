pub mod history;
pub mod im_channel;
