#[cfg(feature = "async")]
mod enabled {
    use std::time::Duration;

    use drac::AsyncDracClient;

    #[tokio::main(flavor = "current_thread")]
    pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
        // Example:
        //   cargo run --example tokio_boot_devices --features tokio -- 192.168.1.10 root calvin
        let mut args = std::env::args().skip(1);
        let host = args.next().ok_or("missing <host>")?;
        let username = args.next().ok_or("missing <username>")?;
        let password = args.next().ok_or("missing <password>")?;

        let client = AsyncDracClient::builder(host)
            .username(username)
            .password(password)
            .verify_tls(false)
            .timeout(Duration::from_secs(60))
            .build_async()?;

        for mode in client.list_boot_modes().await? {
            let marker = if mode.is_next { " (next)" } else { "" };
            println!("{}{marker}", mode.id);
        }

        for (mode, devices) in client.list_boot_devices().await? {
            println!("{mode}:");
            for device in devices {
                println!(
                    "  {} {}",
                    device.pending_assigned_sequence, device.bios_boot_string
                );
            }
        }

        Ok(())
    }
}

#[cfg(feature = "async")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    enabled::main()
}

#[cfg(not(feature = "async"))]
fn main() {
    eprintln!("This example requires feature `async` (or `tokio`).");
}
