use drac::DracClient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example:
    //   cargo run --example list_jobs -- 192.168.1.10 root calvin [--unfinished]
    let mut args = std::env::args().skip(1);
    let host = args.next().ok_or("missing <host>")?;
    let username = args.next().ok_or("missing <username>")?;
    let password = args.next().ok_or("missing <password>")?;
    let only_unfinished = args.next().as_deref() == Some("--unfinished");

    let client = DracClient::builder(host)
        .username(username)
        .password(password)
        .verify_tls(false)
        .build()?;

    println!("Lifecycle Controller: {}", client.get_lifecycle_controller_version()?);
    for job in client.list_jobs(only_unfinished)? {
        println!(
            "{:<20} {:<32} {:<12} {:>4}%  {}",
            job.id, job.name, job.state, job.percent_complete, job.message
        );
    }

    Ok(())
}
