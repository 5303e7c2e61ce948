pub mod table;
pub mod json;

use crate::pages::{DaysPage, HostsPage, InstantsPage, Page};

pub fn render(page: &Page, json_output: bool) -> String {
    if json_output {
        let mut out = json::render(page);
        out.push('\n');
        return out;
    }

    match page {
        Page::Days(days) => render_days(days),
        Page::Instants(instants) => render_instants(instants),
        Page::Hosts(hosts) => render_hosts(hosts),
        Page::Snapshot(snapshot) => table::render(snapshot),
    }
}

fn render_days(page: &DaysPage) -> String {
    if page.days.is_empty() {
        return String::from("No snapshots stored yet.\n");
    }

    let mut output = String::from("Days with snapshots:\n");
    for day in &page.days {
        output.push_str(&format!("  {day}\n"));
    }
    output
}

fn render_instants(page: &InstantsPage) -> String {
    if page.times.is_empty() {
        return format!("No snapshots on {}.\n", page.date);
    }

    let mut output = format!("Snapshot times on {}:\n", page.date);
    for time in &page.times {
        output.push_str(&format!("  {time}\n"));
    }
    output
}

fn render_hosts(page: &HostsPage) -> String {
    if page.hosts.is_empty() {
        return format!("No snapshots at {}.\n", page.timestamp);
    }

    let mut output = format!("Snapshots at {}:\n", page.timestamp);
    for host in &page.hosts {
        output.push_str(&format!("\n{}\n", host.hostname));
        output.push_str(&"-".repeat(40));
        output.push('\n');
        for title in &host.titles {
            output.push_str(&format!("  {title}\n"));
        }
    }
    output
}
