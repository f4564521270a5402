use anyhow::{Context, Result};
use analog_scan::config::{PERSISTENCE, demo_series_filename};
use chrono::{Duration, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let target = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(PERSISTENCE.corpus.directory));
    build_demo_corpus(&target)
}

fn build_demo_corpus(target: &Path) -> Result<()> {
    fs::create_dir_all(target)
        .with_context(|| format!("Failed to create corpus directory {:?}", target))?;

    let demo = &PERSISTENCE.demo;
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).context("Invalid start date")?;

    for index in 0..demo.series_count {
        let path = target.join(demo_series_filename(index));
        let closes = random_walk(index as u64, demo.series_len, demo.start_price);

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {:?}", path))?;
        writer.write_record(["Date", PERSISTENCE.corpus.close_column])?;
        for (day, close) in closes.iter().enumerate() {
            let date = start + Duration::days(day as i64);
            writer.write_record([date.format("%Y-%m-%d").to_string(), format!("{:.4}", close)])?;
        }
        writer.flush()?;
    }

    println!(
        "✅ Demo corpus written to {:?} with {} series of {} closes.",
        target, demo.series_count, demo.series_len
    );
    Ok(())
}

/// Geometric random walk with a little drift, seeded per series so reruns are identical.
fn random_walk(seed: u64, len: usize, start_price: f64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let mut price = start_price;
    let drift = ((seed % 7) as f64 - 3.0) * 0.0002;

    (0..len)
        .map(|_| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let uniform = (state >> 11) as f64 / (1u64 << 53) as f64;
            let step = drift + (uniform - 0.5) * 0.04;
            price = (price * (1.0 + step)).max(0.01);
            price
        })
        .collect()
}
