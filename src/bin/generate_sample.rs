use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Datelike, NaiveDate, Weekday};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Deterministic Gaussian noise for the price walk (splitmix64 + Box-Muller).
struct Noise(u64);

impl Noise {
    fn uniform(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(1e-15);
        let u2 = self.uniform();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

#[derive(Debug, Serialize)]
struct Row {
    date: NaiveDate,
    close: f64,
    daily_return: Option<f64>,
    volatility_7: Option<f64>,
    ma_30: Option<f64>,
    ma_90: Option<f64>,
    bb_upper: Option<f64>,
    bb_lower: Option<f64>,
}

/// Trailing-window statistic over `values`, `None` until the window is full.
fn rolling(values: &[Option<f64>], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice: Option<Vec<f64>> = values[i + 1 - window..=i].iter().copied().collect();
            slice.map(|s| f(&s))
        })
        .collect()
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

fn std_dev(v: &[f64]) -> f64 {
    let m = mean(v);
    (v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (v.len() - 1) as f64).sqrt()
}

fn trading_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

fn build_rows(noise: &mut Noise, start: NaiveDate, count: usize) -> Vec<Row> {
    let dates = trading_days(start, count);

    // Geometric random walk with a slight upward drift.
    let mut price = 1200.0;
    let closes: Vec<f64> = dates
        .iter()
        .map(|_| {
            price *= 1.0 + noise.gauss(0.0002, 0.009);
            (price * 100.0).round() / 100.0
        })
        .collect();

    let returns: Vec<Option<f64>> = std::iter::once(None)
        .chain(closes.windows(2).map(|w| Some(w[1] / w[0] - 1.0)))
        .collect();
    let close_opt: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();

    let volatility_7 = rolling(&returns, 7, std_dev);
    let ma_30 = rolling(&close_opt, 30, mean);
    let ma_90 = rolling(&close_opt, 90, mean);
    let ma_20 = rolling(&close_opt, 20, mean);
    let sd_20 = rolling(&close_opt, 20, std_dev);

    dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let band = ma_20[i].zip(sd_20[i]);
            Row {
                date,
                close: closes[i],
                daily_return: returns[i],
                volatility_7: volatility_7[i],
                ma_30: ma_30[i],
                ma_90: ma_90[i],
                bb_upper: band.map(|(m, s)| m + 2.0 * s),
                bb_lower: band.map(|(m, s)| m - 2.0 * s),
            }
        })
        .collect()
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn to_batch(rows: &[Row]) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    let days: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();

    let column = |f: fn(&Row) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Date32, false),
        Field::new("close", DataType::Float64, false),
        Field::new("daily_return", DataType::Float64, true),
        Field::new("volatility_7", DataType::Float64, true),
        Field::new("ma_30", DataType::Float64, true),
        Field::new("ma_90", DataType::Float64, true),
        Field::new("bb_upper", DataType::Float64, true),
        Field::new("bb_lower", DataType::Float64, true),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Date32Array::from(days)) as ArrayRef,
            column(|r| Some(r.close)),
            column(|r| r.daily_return),
            column(|r| r.volatility_7),
            column(|r| r.ma_30),
            column(|r| r.ma_90),
            column(|r| r.bb_upper),
            column(|r| r.bb_lower),
        ],
    )
    .context("building record batch")
}

fn write_parquet(batch: &RecordBatch, path: &str) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut noise = Noise(42);
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).context("start date")?;
    let rows = build_rows(&mut noise, start, 2500);

    let csv_path = "gold_price_forecasting_dataset.csv";
    let parquet_path = "gold_price_forecasting_dataset.parquet";

    write_csv(&rows, csv_path)?;
    let batch = to_batch(&rows)?;
    write_parquet(&batch, parquet_path)?;

    let tail = batch.slice(batch.num_rows().saturating_sub(5), 5.min(batch.num_rows()));
    println!("{}", pretty_format_batches(&[tail]).context("formatting preview")?);
    println!(
        "Wrote {} trading days ({} to {}) to {csv_path} and {parquet_path}",
        rows.len(),
        rows.first().map(|r| r.date.to_string()).unwrap_or_default(),
        rows.last().map(|r| r.date.to_string()).unwrap_or_default(),
    );
    Ok(())
}
