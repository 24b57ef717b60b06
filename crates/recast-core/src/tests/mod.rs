mod fakes;
mod overlay;
mod recorder;
mod writer;
