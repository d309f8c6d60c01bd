pub mod init;
pub mod prepare;
pub mod reconcile;
pub mod sync_upgrade;
