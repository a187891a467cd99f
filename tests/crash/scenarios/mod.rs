mod export_write;
mod snapshot_write;
#[cfg(unix)]
mod termination;
