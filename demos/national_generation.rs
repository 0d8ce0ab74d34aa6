use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use pvlive::{PvLive, Query};

fn main() -> Result<()> {
    // Example program that calls the library API.
    // The base URL can be overridden via PVLIVE_URL or a `.pvliverc` file.
    let client = PvLive::from_env()?;
    let national = Query::new().with_extra_fields("installedcapacity_mwp,ucl_mw,lcl_mw")?;

    if let Some(latest) = client.latest(&national)? {
        println!("latest: {:?}", latest.tuple());
    }

    let day = NaiveDate::from_ymd_opt(2018, 6, 3).expect("valid date");
    let peak = client.day_peak_frame(day, &national)?;
    println!("peak on {day}:\n{peak:?}");
    println!("energy on {day}: {:.1} MWh", client.day_energy(day, &Query::new())?);

    let afternoon = client.between_frame(
        Utc.with_ymd_and_hms(2018, 7, 3, 12, 20, 0).unwrap(),
        Utc.with_ymd_and_hms(2018, 7, 3, 14, 0, 0).unwrap(),
        &Query::new().gsp(120),
    )?;
    println!("{afternoon:?}");
    Ok(())
}
