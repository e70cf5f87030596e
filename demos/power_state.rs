use drac::{DracClient, PowerState};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example:
    //   cargo run --example power_state -- 192.168.1.10 root calvin [on|off|reboot]
    let mut args = std::env::args().skip(1);
    let host = args.next().ok_or("missing <host>")?;
    let username = args.next().ok_or("missing <username>")?;
    let password = args.next().ok_or("missing <password>")?;
    let action = args.next();

    let client = DracClient::builder(host)
        .username(username)
        .password(password)
        .verify_tls(false)
        .build()?;

    let Some(action) = action else {
        println!("Power state: {}", client.get_power_state()?);
        return Ok(());
    };

    let target = match action.to_ascii_lowercase().as_str() {
        "on" => PowerState::PowerOn,
        "off" => PowerState::PowerOff,
        "reboot" => PowerState::Reboot,
        other => other.to_ascii_uppercase().parse()?,
    };

    client.set_power_state(target)?;
    println!("Requested power state: {target}");

    Ok(())
}
