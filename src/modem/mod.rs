/*

Recorded pulse trains as text
-----------------------------

Broadlink (base64/hex) and raw `+mark -space` lines <> Recording

CLI:

# Prints the frame for a state
encode --mode cool --temperature 24 --fan high --swing off -f base64

# Reads one frame per line from stdin and prints the decoded state
decode -f raw

*/

pub mod codecs;
pub use codecs::{create_codec, Codec, CodecError, CodecType};
