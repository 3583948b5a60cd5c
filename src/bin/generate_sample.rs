use std::fmt::Write as _;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Rows written to the sample file.
const ROWS: usize = 500;

const PROTOCOLS: [(&str, f64); 3] = [("tcp", 0.6), ("udp", 0.3), ("icmp", 0.1)];
const SERVICES: [&str; 5] = ["http", "smtp", "ftp_data", "domain_u", "ecr_i"];
const FLAGS: [&str; 3] = ["SF", "S0", "REJ"];

fn pick_weighted<'a>(rng: &mut ChaCha8Rng, choices: &[(&'a str, f64)]) -> &'a str {
    let mut roll: f64 = rng.gen();
    for &(name, weight) in choices {
        if roll < weight {
            return name;
        }
        roll -= weight;
    }
    choices[choices.len() - 1].0
}

fn main() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut out = String::new();
    writeln!(out, "% Synthetic network connection records")?;
    writeln!(out, "@relation 'network_sample'")?;
    writeln!(out)?;
    writeln!(out, "@attribute duration numeric")?;
    writeln!(out, "@attribute 'protocol_type' {{tcp,udp,icmp}}")?;
    writeln!(out, "@attribute service {{{}}}", SERVICES.join(","))?;
    writeln!(out, "@attribute flag {{{}}}", FLAGS.join(","))?;
    writeln!(out, "@attribute src_bytes numeric")?;
    writeln!(out, "@attribute dst_bytes numeric")?;
    writeln!(out, "@attribute serror_rate real")?;
    writeln!(out, "@attribute class {{normal,anomaly}}")?;
    writeln!(out)?;
    writeln!(out, "@data")?;

    let mut anomalies = 0;
    for _ in 0..ROWS {
        let protocol = pick_weighted(&mut rng, &PROTOCOLS);
        let service = SERVICES[rng.gen_range(0..SERVICES.len())];
        let anomaly = rng.gen_bool(if protocol == "icmp" { 0.7 } else { 0.3 });
        let flag = if anomaly { FLAGS[rng.gen_range(1..FLAGS.len())] } else { "SF" };
        let duration: u32 = if protocol == "tcp" { rng.gen_range(0..500) } else { 0 };
        let src_bytes: u32 = rng.gen_range(0..20_000);
        let dst_bytes: u32 = if anomaly { 0 } else { rng.gen_range(0..50_000) };
        let serror_rate: f64 = if anomaly { rng.gen_range(0.5..1.0) } else { rng.gen_range(0.0..0.1) };
        let class = if anomaly { "anomaly" } else { "normal" };
        anomalies += usize::from(anomaly);

        writeln!(
            out,
            "{duration},{protocol},{service},{flag},{src_bytes},{dst_bytes},{serror_rate:.2},{class}"
        )?;
    }

    let output_path = "sample_data.arff";
    std::fs::write(output_path, out).with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {ROWS} connection records ({anomalies} anomalies) to {output_path}");
    Ok(())
}
