// End-to-end tests of the narration pipeline.
//
// Each test runs the real segmenter, worker pool, progress store and
// assembler inside its own temp directory, with a scripted provider that
// echoes text back as audio and a merger that concatenates bytes.

mod helpers;
mod test_pipeline;
mod test_resume;
