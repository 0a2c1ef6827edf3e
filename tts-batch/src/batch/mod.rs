//! Batch driver: text files in, size-bounded WAV files out.
//!
//! Files are processed one at a time. Within a file every segment is
//! synthesized, written and observed before the next one starts, since the
//! rollover decision depends on the bytes left by the previous write.

pub mod probe;
pub mod report;

pub use report::{BatchReport, FileReport, SkippedSegment};

use crate::audio::ChunkedWavWriter;
use crate::character::{VoiceProfile, VoiceSelection, turn_index};
use crate::config::BatchConfig;
use crate::error::SynthesisError;
use crate::progress::{ProgressEstimator, WARMUP_SEGMENTS, format_duration};
use crate::text::{self, Segmentation};
use crate::tts::Synthesizer;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the directory, next to the input directory, that receives the audio.
pub const OUTPUT_DIR_NAME: &str = "tts";

/// Output directory for an input directory: `<parent>/tts`.
pub fn output_dir_for(input_dir: &Path) -> PathBuf {
    input_dir
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(OUTPUT_DIR_NAME)
}

/// `.txt` files in `dir`, ordered by turn index, then by name.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "txt").unwrap_or(false) {
            files.push(path);
        }
    }

    files.sort_by_key(|path| {
        let name = file_name(path);
        (turn_index(&name).unwrap_or(u64::MAX), name)
    });
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a text file as lines.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Write preprocessed segments, one per line, as they will be sent to the model.
pub fn write_segments(segmentation: &Segmentation, out: &mut dyn Write) -> Result<()> {
    for segment in &segmentation.segments {
        out.write_all(segment.text().as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Runs synthesis over a directory of speaker-turn files.
pub struct BatchDriver<'a> {
    config: &'a BatchConfig,
    voices: &'a VoiceSelection,
    synthesizer: &'a dyn Synthesizer,
}

impl<'a> BatchDriver<'a> {
    pub fn new(
        config: &'a BatchConfig,
        voices: &'a VoiceSelection,
        synthesizer: &'a dyn Synthesizer,
    ) -> Self {
        Self {
            config,
            voices,
            synthesizer,
        }
    }

    /// Process every input file of `input_dir` into `output_dir_for(input_dir)`.
    ///
    /// Files without a usable character are skipped and files that hit an I/O
    /// error are recorded as failed; both are reported and the batch goes on.
    /// A configuration error or a backend failure stops the batch.
    pub fn run(&self, input_dir: &Path) -> Result<BatchReport> {
        self.voices.validate(self.config)?;

        let output_dir = output_dir_for(input_dir);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let inputs = list_input_files(input_dir)?;
        log::info!(
            "Processing {} file(s) from {} with {}",
            inputs.len(),
            input_dir.display(),
            self.synthesizer.name()
        );

        let mut report = BatchReport::new(input_dir, &output_dir);
        for (i, input) in inputs.iter().enumerate() {
            let name = file_name(input);
            let profile = match self.voices.resolve(&name, self.config) {
                Ok(profile) => profile,
                Err(e) => {
                    log::warn!("Skipping {}: {}", name, e);
                    report.skip_file(input, e.to_string());
                    continue;
                }
            };

            log::info!(
                "[{}/{}] {} ({}, limit {})",
                i + 1,
                inputs.len(),
                name,
                profile.voice,
                profile.limit
            );
            let mut file_report = FileReport::new(input, &profile);
            match self.process_file(input, &profile, &output_dir, &mut file_report) {
                Ok(()) => report.files.push(file_report),
                Err(e) if is_backend_failure(&e) => {
                    report.fail_file(input, format!("{:#}", e), file_report.outputs);
                    report.finish();
                    save_report(&report);
                    return Err(e.context(format!("Synthesis backend failed on {}", name)));
                }
                Err(e) => {
                    log::error!("Failed to process {}: {:#}", name, e);
                    report.fail_file(input, format!("{:#}", e), file_report.outputs);
                }
            }
        }

        report.finish();
        save_report(&report);
        Ok(report)
    }

    /// Synthesize one input file into `<output_dir>/<stem>.wav` (plus rollover parts).
    ///
    /// `file_report` is filled in as segments complete, so on error it still
    /// lists the audio files written before the failure.
    pub fn process_file(
        &self,
        input: &Path,
        profile: &VoiceProfile,
        output_dir: &Path,
        file_report: &mut FileReport,
    ) -> Result<()> {
        let lines = load_lines(input)?;
        let segmentation = text::preprocess(&lines, profile.limit)?;
        file_report.segments = segmentation.len();
        file_report.total_chars = segmentation.total_chars;

        if segmentation.is_empty() {
            log::warn!("{} contains no text, no audio written", input.display());
            return Ok(());
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_path = output_dir.join(format!("{}.wav", stem));

        let mut writer = ChunkedWavWriter::create(
            &base_path,
            self.config.synthesis.sample_rate,
            self.config.file_size_limit,
        )?;
        let pb = self.progress_bar(segmentation.total_chars);

        let written = self.synthesize_segments(
            input,
            profile,
            &segmentation,
            &mut writer,
            &pb,
            file_report,
        );
        pb.finish_and_clear();
        file_report.outputs = writer.files().to_vec();
        written?;

        writer.close()?;
        log::info!(
            "{} -> {} file(s), {} segment(s) skipped",
            input.display(),
            file_report.outputs.len(),
            file_report.skipped_segments.len()
        );
        Ok(())
    }

    fn synthesize_segments(
        &self,
        input: &Path,
        profile: &VoiceProfile,
        segmentation: &Segmentation,
        writer: &mut ChunkedWavWriter,
        pb: &ProgressBar,
        file_report: &mut FileReport,
    ) -> Result<()> {
        let mut estimator =
            ProgressEstimator::new(segmentation.total_chars, self.config.synthesis.sample_rate);

        for (index, segment) in segmentation.segments.iter().enumerate() {
            let audio_bytes = match self.synthesizer.synthesize(
                segment.text(),
                &profile.voice,
                &self.config.synthesis,
            ) {
                Ok(samples) => {
                    let write = writer.write_chunk(&samples)?;
                    if write.rolled_over {
                        estimator.start_next_file();
                        pb.suspend(|| {
                            log::info!(
                                "Size limit of {} bytes reached, continuing in part {} ({})",
                                self.config.file_size_limit,
                                write.file_index,
                                writer.current_path().display()
                            )
                        });
                    }
                    write.chunk_bytes
                }
                Err(e) if e.is_recoverable() => {
                    pb.suspend(|| {
                        log::warn!(
                            "{}: skipping segment {}: {}: {:?}",
                            input.display(),
                            index,
                            e,
                            segment.body()
                        )
                    });
                    file_report.skipped_segments.push(SkippedSegment {
                        index,
                        text: segment.text().to_string(),
                        reason: e.to_string(),
                    });
                    0
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e).context(format!("segment {}", index)));
                }
            };

            let snapshot = estimator.observe(segment.char_len(), audio_bytes);
            if snapshot.segment_number == WARMUP_SEGMENTS {
                pb.suspend(|| log::info!("Warm-up took {}", format_duration(estimator.warmup())));
            }
            file_report.audio_bytes += audio_bytes;
            pb.set_position(snapshot.processed_chars as u64);
            pb.set_message(snapshot.to_string());
            log::debug!(
                "{}/{} {} : {}",
                index + 1,
                segmentation.len(),
                snapshot,
                segment.body()
            );
        }
        Ok(())
    }

    fn progress_bar(&self, total_chars: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total_chars as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

fn is_backend_failure(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<SynthesisError>(),
        Some(SynthesisError::Backend(_))
    )
}

fn save_report(report: &BatchReport) {
    match report.save() {
        Ok(path) => log::info!("Report written to {}", path.display()),
        Err(e) => log::error!("{:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{HEADER_SIZE, pcm_bytes};
    use crate::character::{Character, CharacterMap};
    use crate::config::TtsBatchConfig;
    use crate::tts::mock::MockSynthesizer;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        input_dir: PathBuf,
    }

    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join("dialog").join("text");
        fs::create_dir_all(&input_dir).unwrap();
        for (name, content) in files {
            fs::write(input_dir.join(name), content).unwrap();
        }
        Fixture {
            _dir: dir,
            input_dir,
        }
    }

    fn config(file_size_limit: u64, limit: usize) -> BatchConfig {
        let mut settings = TtsBatchConfig::default();
        settings.sample_rate = 8_000;
        settings.file_size_limit = file_size_limit;
        settings.line_length_limits.insert("xenia".to_string(), limit);
        BatchConfig::from_settings(&settings)
            .unwrap()
            .with_progress(false)
    }

    fn characters() -> VoiceSelection {
        let mut map = CharacterMap::default();
        map.insert(
            "Alice",
            Character {
                speaker: "xenia".to_string(),
                pitch: 12,
            },
        );
        VoiceSelection::ByCharacter(map)
    }

    #[test]
    fn test_output_dir_for() {
        assert_eq!(
            output_dir_for(Path::new("dialog1/text")),
            PathBuf::from("dialog1/tts")
        );
        assert_eq!(output_dir_for(Path::new("text")), PathBuf::from("tts"));
    }

    #[test]
    fn test_list_input_files_sorted_by_turn() {
        let fx = fixture(&[
            ("10_Alice.txt", "x"),
            ("2_Alice.txt", "x"),
            ("1_Alice.txt", "x"),
            ("readme.md", "x"),
        ]);
        let names: Vec<String> = list_input_files(&fx.input_dir)
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["1_Alice.txt", "2_Alice.txt", "10_Alice.txt"]);
    }

    #[test]
    fn test_run_produces_wav_per_file() {
        let fx = fixture(&[
            ("1_Alice.txt", "Alice: Привет. Как дела?\n\nВсё хорошо!"),
            ("2_Alice.txt", "Alice: 1 11"),
        ]);
        let config = config(1024 * 1024, 100);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(500);

        let report = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap();

        assert_eq!(report.files.len(), 2);
        assert!(report.failed_files.is_empty());
        assert_eq!(synth.call_count(), 3);
        assert_eq!(
            synth.texts(),
            vec![
                "Alice: Привет. Как дела?\n",
                "Всё хорошо!\n",
                "Alice: один одиннадцать\n"
            ]
        );

        let first = &report.files[0];
        assert_eq!(first.pitch, 12);
        assert_eq!(first.segments, 2);
        assert_eq!(first.audio_bytes, 2 * pcm_bytes(500));
        let output = output_dir_for(&fx.input_dir).join("1_Alice.wav");
        assert_eq!(first.outputs, vec![output.clone()]);
        assert_eq!(
            fs::metadata(&output).unwrap().len(),
            HEADER_SIZE + 2 * pcm_bytes(500)
        );
        assert!(report.output_dir.join(report::REPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_failed_segment_is_skipped() {
        let fx = fixture(&[("1_Alice.txt", "Один.\nДва.\nТри.")]);
        let config = config(1024 * 1024, 100);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(100).rejecting_calls(&[1]);

        let report = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap();

        let file = &report.files[0];
        assert_eq!(synth.call_count(), 3);
        assert_eq!(file.segments, 3);
        assert_eq!(file.audio_bytes, 2 * pcm_bytes(100));
        assert_eq!(file.skipped_segments.len(), 1);
        assert_eq!(file.skipped_segments[0].index, 1);
        assert_eq!(file.skipped_segments[0].text, "Два.\n");

        let reader = hound::WavReader::open(&file.outputs[0]).unwrap();
        assert_eq!(reader.len(), 200);
    }

    #[test]
    fn test_rollover_across_output_files() {
        let text: String = (0..10).map(|i| format!("Фраза {}.\n", i)).collect();
        let fx = fixture(&[("1_Alice.txt", text.as_str())]);
        // three 100-sample chunks per file
        let config = config(HEADER_SIZE + 3 * pcm_bytes(100), 100);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(100);

        let report = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap();

        let outputs = &report.files[0].outputs;
        assert_eq!(outputs.len(), 4);
        assert!(outputs[1].ends_with("1_Alice.part1.wav"));
        assert!(outputs[3].ends_with("1_Alice.part3.wav"));
        let samples: Vec<u32> = outputs
            .iter()
            .map(|p| hound::WavReader::open(p).unwrap().len())
            .collect();
        assert_eq!(samples, vec![300, 300, 300, 100]);
    }

    #[test]
    fn test_missing_character_skips_file() {
        let fx = fixture(&[
            ("1_Carol.txt", "Текст."),
            ("2_Alice.txt", "Текст."),
            ("notes.txt", "x"),
        ]);
        let config = config(1024 * 1024, 100);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(10);

        let report = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.skipped_files.len(), 2);
        assert!(report.skipped_files.iter().any(|s| s.reason.contains("Carol")));
        assert_eq!(synth.call_count(), 1);
    }

    #[test]
    fn test_backend_failure_stops_batch() {
        let fx = fixture(&[("1_Alice.txt", "Раз.\nДва."), ("2_Alice.txt", "Три.")]);
        let config = config(1024 * 1024, 100);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(10).backend_failure_at(1);

        let err = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap_err();

        assert!(format!("{:#}", err).contains("1_Alice.txt"));
        assert_eq!(synth.call_count(), 2);

        // audio written before the failure is kept
        let output = output_dir_for(&fx.input_dir).join("1_Alice.wav");
        assert_eq!(hound::WavReader::open(&output).unwrap().len(), 10);

        let report_path = output_dir_for(&fx.input_dir).join(report::REPORT_FILE_NAME);
        let saved = BatchReport::load(&report_path).unwrap();
        assert_eq!(saved.failed_files.len(), 1);
        assert!(saved.failed_files[0].error.contains("segment 1"));
        assert_eq!(saved.failed_files[0].outputs, vec![output]);
        assert!(saved.finished_at.is_some());
    }

    #[test]
    fn test_unwritable_output_fails_only_that_file() {
        let fx = fixture(&[("1_Alice.txt", "Раз."), ("2_Alice.txt", "Два.")]);
        let output_dir = output_dir_for(&fx.input_dir);
        // a directory where the first WAV file should go
        fs::create_dir_all(output_dir.join("1_Alice.wav")).unwrap();
        let config = config(1024 * 1024, 100);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(32);

        let report = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap();

        assert_eq!(report.failed_files.len(), 1);
        assert!(report.failed_files[0].input.ends_with("1_Alice.txt"));
        assert!(report.failed_files[0].error.contains("1_Alice.wav"));
        assert!(report.failed_files[0].outputs.is_empty());

        assert_eq!(report.files.len(), 1);
        let second = output_dir.join("2_Alice.wav");
        assert_eq!(report.files[0].outputs, vec![second.clone()]);
        assert_eq!(hound::WavReader::open(&second).unwrap().len(), 32);

        assert!(report.check().is_err());
    }

    #[test]
    fn test_unknown_voice_is_fatal() {
        let fx = fixture(&[("1_Alice.txt", "Текст.")]);
        let config = config(1024 * 1024, 100);
        let voices = VoiceSelection::Fixed {
            voice: "nobody".to_string(),
            pitch: 0,
        };
        let synth = MockSynthesizer::always_succeeds(10);

        assert!(
            BatchDriver::new(&config, &voices, &synth)
                .run(&fx.input_dir)
                .is_err()
        );
        assert_eq!(synth.call_count(), 0);
    }

    #[test]
    fn test_long_lines_are_segmented_for_voice() {
        let line = "слово ".repeat(40);
        let fx = fixture(&[("1_Alice.txt", line.as_str())]);
        let config = config(1024 * 1024, 30);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(1);

        let report = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap();

        assert!(report.files[0].segments > 1);
        assert!(synth.texts().iter().all(|t| t.chars().count() <= 30));
    }

    #[test]
    fn test_empty_file_writes_nothing() {
        let fx = fixture(&[("1_Alice.txt", "\n   \n")]);
        let config = config(1024 * 1024, 100);
        let voices = characters();
        let synth = MockSynthesizer::always_succeeds(1);

        let report = BatchDriver::new(&config, &voices, &synth)
            .run(&fx.input_dir)
            .unwrap();

        assert!(report.files[0].outputs.is_empty());
        assert_eq!(synth.call_count(), 0);
    }

    #[test]
    fn test_write_segments() {
        let segmentation = text::preprocess(&["Раз. Два.", "", "3"], 100).unwrap();
        let mut out = Vec::new();
        write_segments(&segmentation, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Раз. Два.\nтри\n");
    }
}
