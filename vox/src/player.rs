//! Live playback consumer: drains the byte stream and renders raw samples.

use std::io::Read;
use std::thread::{self, JoinHandle};

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use speech::PlaybackReader;
use tracing::{debug, warn};

/// Bytes pulled from the stream per device buffer (s16le, mono).
const CHUNK_BYTES: usize = 4096;

/// Spawn the playback thread. It exits when the stream reaches end-of-file
/// or fails. Render problems are logged here; the session notices the
/// dropped reader through its playback sink and aborts on its own.
pub fn spawn(reader: PlaybackReader, sample_rate: u32) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(err) = render(reader, sample_rate) {
            warn!(%err, "live playback stopped");
        }
    })
}

fn render(mut reader: PlaybackReader, sample_rate: u32) -> anyhow::Result<()> {
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;

    let mut buf = vec![0u8; CHUNK_BYTES];
    let mut filled = 0usize;
    loop {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
        // Only whole s16le samples go to the device; a split byte carries
        // over into the next read.
        let whole = filled - filled % 2;
        if whole == 0 {
            continue;
        }
        let samples: Vec<i16> = buf[..whole]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        sink.append(SamplesBuffer::new(1, sample_rate, samples));
        if filled > whole {
            buf[0] = buf[whole];
            filled = 1;
        } else {
            filled = 0;
        }
    }
    debug!("playback stream drained");
    sink.sleep_until_end();
    Ok(())
}
