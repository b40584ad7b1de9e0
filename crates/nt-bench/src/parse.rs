//! Parsing of benchmark output.
//!
//! The iotools benchmarks print RNTuple metrics as `name|unit|value` lines
//! when run with `-p`; peak memory comes from wrapping the run in
//! `/usr/bin/time`, which appends a `<kilobytes>maxresident` figure.

/// Value of a `name|unit|value` metric line containing `key`.
pub fn metric(output: &str, key: &str) -> Option<f64> {
    output
        .lines()
        .find(|line| line.contains(key))
        .and_then(|line| line.rsplit('|').next())
        .and_then(|value| value.trim().parse().ok())
}

/// Benchmark throughput in MB/s: unzipped volume over total wall time
/// spent reading and decompressing.
pub fn throughput_mbps(output: &str) -> Option<f64> {
    let volume = metric(output, "RNTupleReader.RPageSourceFile.szUnzip")?;
    let unzip_ns = metric(output, "RNTupleReader.RPageSourceFile.timeWallUnzip")?;
    let read_ns = metric(output, "RNTupleReader.RPageSourceFile.timeWallRead")?;

    let seconds = (unzip_ns + read_ns) / 1e9;
    if seconds <= 0.0 {
        return None;
    }
    Some(volume / 1e6 / seconds)
}

/// Peak resident set size in KB from `/usr/bin/time` output.
pub fn max_resident_kb(output: &str) -> Option<f64> {
    let token = output
        .split_whitespace()
        .find(|token| token.contains("maxresident"))?;
    let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
