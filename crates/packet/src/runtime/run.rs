//! Run — stream packets from input through the pipeline.

use std::io::{self, BufRead, Write};

use tracing::info;

use crate::conf::ReaderConfig;
use crate::filter::{Pipeline, Verdict};
use crate::packet::{Packet, PacketReader, ReaderStats};

/// Read stdin, write accepted packets to stdout and, when configured,
/// rejected packets to stderr.
pub fn run(config: ReaderConfig, pipeline: Pipeline) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin().lock();
    let mut stdout = io::BufWriter::new(io::stdout().lock());
    let mut stderr = io::stderr().lock();
    let rejected: Option<&mut dyn Write> = if config.write_rejected {
        Some(&mut stderr)
    } else {
        None
    };

    let stats = process(stdin, &mut stdout, rejected, &pipeline, config.max_packet_lines)?;
    stdout.flush()?;

    let (evaluated, accepted, rejected) = pipeline.stats();
    info!(
        "Done: lines={}, packets={}, parse_errors={}, overflows={}, evaluated={}, accepted={}, rejected={}",
        stats.lines, stats.packets, stats.parse_errors, stats.overflows, evaluated, accepted, rejected
    );
    Ok(())
}

pub fn process<R: BufRead, W: Write>(
    input: R,
    accepted: &mut W,
    mut rejected: Option<&mut dyn Write>,
    pipeline: &Pipeline,
    max_lines: usize,
) -> io::Result<ReaderStats> {
    let mut reader = PacketReader::new(input).max_lines(max_lines);
    for packet in reader.by_ref() {
        match pipeline.evaluate(packet?) {
            Verdict::Accept(p) => write_packet(accepted, &p)?,
            Verdict::Reject(p) => {
                if let Some(out) = rejected.as_mut() {
                    write_packet(out, &p)?;
                }
            }
        }
    }
    Ok(reader.stats())
}

fn write_packet<W: Write + ?Sized>(out: &mut W, packet: &Packet) -> io::Result<()> {
    out.write_all(packet.as_bytes())?;
    out.write_all(b"\r\n")
}
