use crate::config::Config;
use crate::constants::DEFAULT_HOSTNAME;
use log::{debug, info};
use std::path::Path;
use sysinfo::{DiskExt, System, SystemExt};

/// Name announced in the greeting: the configured one, else the machine's.
pub fn resolve_hostname(config: &Config) -> String {
    if let Some(hostname) = config.server.hostname.as_ref().filter(|h| !h.trim().is_empty()) {
        return hostname.trim().to_string();
    }

    let sys = System::new();
    sys.host_name()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| String::from(DEFAULT_HOSTNAME))
}

/// Free bytes on the disk holding `path`, if a disk can be matched to it.
pub fn get_site_free_space(path: &Path) -> Option<u64> {
    let mut sys = System::new();
    sys.refresh_disks_list();

    // The most specific mount point wins, "/" matches everything.
    let disk = sys
        .disks()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len());

    match disk {
        Some(disk) => {
            debug!(
                "Free space for {:?} on {:?}: {} bytes",
                path,
                disk.mount_point(),
                disk.available_space()
            );
            Some(disk.available_space())
        }
        None => None,
    }
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    info!("  Listen Address: {}", config.server.listen_address);
    info!("  Listen Port: {}", config.server.listen_port);
    info!("  Root Directory: {}", config.server.root_dir);
    info!(
        "  Account and Password Required: {}",
        config.server.require_account_and_password
    );
    info!(
        "  Transfer Buffer Size: {} bytes",
        config.server.transfer_buffer_size()
    );
    info!(
        "  Receive Buffer Size: {} bytes",
        config.server.receive_buffer_size()
    );
}
