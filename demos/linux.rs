use std::error::Error;

use env_logger::Env;
use log::info;
use sixfab_cellular::{linux, Config, Duration};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();

    let tty = std::env::args()
        .nth(1)
        .unwrap_or_else(|| sixfab_cellular::config::DEFAULT_TTY.into());

    let config = Config::default()
        .with_at_timeout(Duration::from_secs(3))
        .with_max_attempts(10);

    let mut shield = linux::open_with_tty(&tty, config)?;
    info!("Board: {}", shield.board());

    shield.init()?;
    shield.led_on()?;

    for (command, expected) in [("ATE1", "OK"), ("ATI", "OK"), ("AT+CSQ", "OK")] {
        let response = shield.send_at_command(command, expected)?;
        info!(
            "{} -> {:?} ({} transmissions)",
            command,
            response.as_str().unwrap_or_default(),
            response.transmissions()
        );
    }

    shield.led_off()?;
    shield.power_down()?;
    shield.close();

    Ok(())
}
