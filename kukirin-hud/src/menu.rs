//! Listing scanned devices and asking which one to connect to.

use eyre::Report;
use kukirin::{DeviceProps, MacAddress};
use std::io::{stdin, stdout, Write};
use std::thread;
use tokio::sync::oneshot;

const NAME_WIDTH: usize = 24;
const NO_NAME: &str = "(no name)";

/// What the user asked for at the device prompt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Choice {
    Quit,
    Rescan,
    /// Connect to the device with the given index in the list.
    Device(usize),
    /// The input wasn't understood; the message says why.
    Invalid(&'static str),
}

/// Interprets a line typed at the prompt, given the number of devices listed.
pub fn parse_choice(input: &str, count: usize) -> Choice {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "q" => Choice::Quit,
        "r" => Choice::Rescan,
        number if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => {
            match number.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => Choice::Device(n - 1),
                _ => Choice::Invalid("Out of range."),
            }
        }
        _ => Choice::Invalid("Wrong input."),
    }
}

/// Formats the table of scanned devices, numbered from 1.
pub fn format_table(devices: &[DeviceProps]) -> String {
    let mut table = format!(
        "\n#  {:<NAME_WIDTH$} {:<17} {:>5}\n-- {} {} -----\n",
        "NAME",
        "ADDRESS",
        "RSSI",
        "-".repeat(NAME_WIDTH),
        "-".repeat(17)
    );
    for (i, device) in devices.iter().enumerate() {
        table += &format_row(
            i + 1,
            device.name.as_deref(),
            &device.mac_address,
            device.rssi,
        );
        table.push('\n');
    }
    table
}

fn format_row(
    number: usize,
    name: Option<&str>,
    address: &MacAddress,
    rssi: Option<i16>,
) -> String {
    let name: String = name.unwrap_or(NO_NAME).chars().take(NAME_WIDTH).collect();
    let rssi = rssi.map(|rssi| rssi.to_string()).unwrap_or_default();
    format!(
        "{:>2} {:<NAME_WIDTH$} {:<17} {:>5}",
        number,
        name,
        address.to_string(),
        rssi
    )
}

/// Asks the user to pick one of `count` devices. End of input counts as quitting.
pub async fn prompt_choice(count: usize) -> Result<Choice, Report> {
    print!("Choose number 1..{count} (r = rescan, q = quit): ");
    stdout().flush()?;

    // Not a blocking task: the runtime waits for those on shutdown, and the prompt may never be
    // answered if the user presses Ctrl+C instead.
    let (sender, receiver) = oneshot::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = sender.send(stdin().read_line(&mut line).map(|read| (read, line)));
    });
    let (read, line) = receiver.await??;
    if read == 0 {
        println!();
        return Ok(Choice::Quit);
    }
    Ok(parse_choice(&line, count))
}
