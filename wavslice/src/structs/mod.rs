//! Data structures shared across the pipeline.
//!
//! Contains the decoded [`AudioBuffer`](audio_buffer::AudioBuffer), the MPEG
//! [`FrameHeader`](frame_header::FrameHeader) and the slice request and offset
//! types handed from the parser to the slice workers.

pub mod audio_buffer;
pub mod frame_header;
pub mod slice_request;
