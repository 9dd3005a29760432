mod batch;
mod modes;
