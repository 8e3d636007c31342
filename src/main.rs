#![warn(unused_extern_crates)]
use ab_glyph::FontRef;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use frames::{Frame, FrameThrottle};
use image::RgbaImage;
use poseguide_core::faces::{SubjectSelector, subject_boxes};
use poseguide_core::overlay::{DrawCommand, Overlay};
use poseguide_core::shapes::point::Point;
use poseguide_core::{
    ComparatorConfig, FaceComparator, FaceComparison, LandmarkSet, Locale, PoseComparator,
    PoseComparison, ReferenceFace, ReferencePoints,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span, trace, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

mod frames;
mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Pose,
    Face,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum LocaleArg {
    #[default]
    Ko,
    En,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Locale {
        match arg {
            LocaleArg::Ko => Locale::Ko,
            LocaleArg::En => Locale::En,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// Compare against the body or the face reference
    #[arg(short, long, value_enum, default_value_t = Mode::Pose)]
    mode: Mode,

    /// Pose offsets JSON. Uses the bundled posture if unset
    #[arg(long, value_name = "FILE")]
    pose_reference: Option<PathBuf>,

    /// Pose centre of mass JSON, overrides any COM in the pose reference
    #[arg(long, value_name = "FILE")]
    com_reference: Option<PathBuf>,

    /// Face reference JSON. Uses the bundled face if unset
    #[arg(long, value_name = "FILE")]
    face_reference: Option<PathBuf>,

    /// Comparator config JSON
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Landmark frames, one JSON object per line. `-` reads stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    frames: PathBuf,

    /// Render the overlay for the first scored frame onto this image
    #[arg(short, long, requires = "output")]
    input: Option<PathBuf>,

    /// Where to write the rendered overlay
    #[arg(short, long, requires = "input")]
    output: Option<PathBuf>,

    /// TTF/OTF font for overlay text. Text is skipped without one
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Language for suggestions and labels
    #[arg(long, value_enum, default_value_t)]
    locale: LocaleArg,

    /// Drop frames closer together than this
    #[arg(long, default_value = "16")]
    min_frame_interval_ms: u64,

    /// Normalized tap point `X,Y` selecting one of several subjects
    #[arg(long, value_parser = parse_point)]
    select: Option<Point>,

    /// Overlay animation phase in [0, 1)
    #[arg(long, default_value = "0")]
    phase: f32,
}

fn parse_point(s: &str) -> std::result::Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {s:?}"))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok(Point::new(x, y))
}

enum Scorer {
    Pose(PoseComparator),
    Face(FaceComparator),
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum Scored {
    Pose(PoseComparison),
    Face(FaceComparison),
}

impl Scorer {
    fn new(args: &CmdArgs) -> Result<Scorer> {
        let config = match &args.config {
            Some(path) => ComparatorConfig::from_path(path)
                .with_context(|| format!("Failed to load config from {path:?}"))?,
            None => ComparatorConfig::default(),
        };
        debug!("Comparator config: {config:?}");

        Ok(match args.mode {
            Mode::Pose => Scorer::Pose(PoseComparator::new(load_pose_reference(args)?, config)?),
            Mode::Face => {
                let reference = match &args.face_reference {
                    Some(path) => ReferenceFace::from_path(path)
                        .with_context(|| format!("Failed to load face reference {path:?}"))?,
                    None => ReferenceFace::bundled()?,
                };
                Scorer::Face(FaceComparator::new(reference, config)?)
            }
        })
    }

    fn score(&self, set: &LandmarkSet, width: u32, height: u32) -> Result<Scored> {
        Ok(match self {
            Scorer::Pose(c) => Scored::Pose(c.compare(set, width, height)?),
            Scorer::Face(c) => Scored::Face(c.compare(set, width, height)?),
        })
    }

    fn orientation(&self) -> poseguide_core::Orientation {
        match self {
            Scorer::Pose(c) => c.config().orientation,
            Scorer::Face(c) => c.config().orientation,
        }
    }
}

impl Scored {
    fn messages(&self, locale: Locale) -> Vec<&'static str> {
        let suggestions = match self {
            Scored::Pose(r) => &r.suggestions,
            Scored::Face(r) => &r.suggestions,
        };
        suggestions.iter().map(|s| s.message(locale)).collect()
    }

    fn overlay(&self, overlay: &Overlay) -> Vec<DrawCommand> {
        match self {
            Scored::Pose(r) => overlay.pose(r),
            Scored::Face(r) => overlay.face(r),
        }
    }
}

fn load_pose_reference(args: &CmdArgs) -> Result<ReferencePoints> {
    let pose = match &args.pose_reference {
        Some(path) => ReferencePoints::from_path(path)
            .with_context(|| format!("Failed to load pose reference {path:?}"))?,
        None => ReferencePoints::bundled()?,
    };

    Ok(match &args.com_reference {
        Some(path) => ReferencePoints::from_path(path)
            .with_context(|| format!("Failed to load COM reference {path:?}"))?
            .merge(pose),
        None => pose,
    })
}

#[derive(Serialize)]
struct FrameReport<'a> {
    frame: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_ms: Option<u64>,
    subject: usize,
    #[serde(flatten)]
    result: &'a Scored,
    messages: Vec<&'static str>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = CmdArgs::parse();
    let scorer = Scorer::new(&args)?;
    let locale = Locale::from(args.locale);

    let reader = frames::spawn_reader(frames::open(&args.frames)?);
    let mut throttle = FrameThrottle::new(args.min_frame_interval_ms);
    let mut selector = SubjectSelector::new();
    let mut pending_tap = args.select;
    let mut stdout = std::io::stdout().lock();

    for (n, frame) in reader.frames().enumerate() {
        let span = span!(Level::INFO, "frame_loop_iter");
        let _guard = span.enter();

        if !throttle.accept(frame.timestamp_ms) {
            trace!("Throttled frame {n}");
            continue;
        }

        if frame.subjects.is_empty() {
            debug!("No subjects in frame {n}");
            continue;
        }

        if let Some(tap) = pending_tap.take() {
            let boxes = subject_boxes(&frame.subjects, scorer.orientation());
            if selector.select_at(&tap, &boxes).is_none() {
                warn!("Tap at {tap:?} hit no subject, using the first");
            }
        }

        let (subject, scored) = match score_frame(&scorer, &selector, &frame) {
            Ok(res) => res,
            Err(e) => {
                warn!("Failed to score frame {n}: {e:?}");
                continue;
            }
        };

        let report = FrameReport {
            frame: n,
            timestamp_ms: frame.timestamp_ms,
            subject,
            result: &scored,
            messages: scored.messages(locale),
        };
        serde_json::to_writer(&mut stdout, &report)?;
        writeln!(stdout)?;

        if let (Some(input), Some(output)) = (&args.input, &args.output) {
            render_overlay(input, output, &scored, &args, locale)?;
            info!("Overlay written to {output:?}");
            break;
        }
    }

    reader.close();

    Ok(())
}

fn score_frame(
    scorer: &Scorer,
    selector: &SubjectSelector,
    frame: &Frame,
) -> Result<(usize, Scored)> {
    let span = span!(Level::DEBUG, "score_frame");
    let _guard = span.enter();

    let subject = selector
        .selected()
        .filter(|idx| *idx < frame.subjects.len())
        .unwrap_or(0);
    let set = selector
        .pick(&frame.subjects)
        .context("Frame has no subjects")?;

    Ok((subject, scorer.score(set, frame.width, frame.height)?))
}

fn render_overlay(
    src: &Path,
    dest: &Path,
    scored: &Scored,
    args: &CmdArgs,
    locale: Locale,
) -> Result<()> {
    let font_bytes = match &args.font {
        Some(path) => {
            Some(std::fs::read(path).with_context(|| format!("Failed to read font {path:?}"))?)
        }
        None => None,
    };
    let font = match &font_bytes {
        Some(bytes) => Some(FontRef::try_from_slice(bytes)?),
        None => None,
    };

    let mut img: RgbaImage = image::open(src)
        .with_context(|| format!("Failed to open {src:?}"))?
        .into();
    let overlay = Overlay::new(img.width(), img.height())
        .with_locale(locale)
        .with_phase(args.phase);
    let cmds = scored.overlay(&overlay);
    debug!("Drawing {} overlay commands", cmds.len());

    render::draw(&mut img, &cmds, font.as_ref());
    img.save(dest)?;
    Ok(())
}
