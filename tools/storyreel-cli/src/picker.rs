//! Line-based image picker for interactive selection.

use std::io::{BufRead, Write};

use storyreel_assembly::{CandidateMap, ImagePicker, PickOutcome, Selection};
use storyreel_common::error::{StoryreelError, StoryreelResult};

/// Asks for one candidate number per scene. An empty answer takes the
/// first candidate; `q` or end of input cancels.
pub struct TerminalPicker<R, W> {
    input: R,
    output: W,
}

impl TerminalPicker<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPicker<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Candidate index chosen for a scene with `count` candidates, or
    /// `None` when the person cancels.
    fn ask(&mut self, scene: &str, count: usize) -> StoryreelResult<Option<usize>> {
        loop {
            write!(self.output, "Pick an image for {scene} [1-{count}, q to cancel]: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            if answer.is_empty() {
                return Ok(Some(0));
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(self.output, "  Enter a number between 1 and {count}.")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> ImagePicker for TerminalPicker<R, W> {
    fn pick(&mut self, candidates: &CandidateMap) -> StoryreelResult<PickOutcome> {
        let mut selection = Selection::new();
        for (scene, images) in candidates {
            if images.is_empty() {
                continue;
            }
            writeln!(self.output, "\n{scene}:")?;
            for (i, image) in images.iter().enumerate() {
                writeln!(self.output, "  {}. {}", i + 1, image.display())?;
            }
            let Some(choice) = self.ask(scene.as_str(), images.len())? else {
                return Ok(PickOutcome::Cancelled);
            };
            let image = images.get(choice).cloned().ok_or_else(|| {
                StoryreelError::invalid_argument(format!("no candidate {choice} for {scene}"))
            })?;
            selection.insert(scene.clone(), image);
        }
        Ok(PickOutcome::Selected(selection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    use storyreel_project_model::scene::SceneId;

    fn candidates() -> CandidateMap {
        let mut map = CandidateMap::new();
        map.insert(
            SceneId::new("scene1"),
            vec![PathBuf::from("scene1_1.jpeg"), PathBuf::from("scene1_2.jpeg")],
        );
        map.insert(SceneId::new("scene2"), vec![PathBuf::from("scene2_1.jpeg")]);
        map
    }

    #[test]
    fn test_numbers_and_blank_answers_select() {
        let mut out = Vec::new();
        let mut picker = TerminalPicker::new(Cursor::new("7\n2\n\n"), &mut out);
        let PickOutcome::Selected(selection) = picker.pick(&candidates()).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(
            selection[&SceneId::new("scene1")],
            PathBuf::from("scene1_2.jpeg")
        );
        assert_eq!(
            selection[&SceneId::new("scene2")],
            PathBuf::from("scene2_1.jpeg")
        );
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("between 1 and 2"));
    }

    #[test]
    fn test_quit_and_end_of_input_cancel() {
        let mut picker = TerminalPicker::new(Cursor::new("q\n"), Vec::new());
        assert_eq!(picker.pick(&candidates()).unwrap(), PickOutcome::Cancelled);

        let mut picker = TerminalPicker::new(Cursor::new("1\n"), Vec::new());
        assert_eq!(picker.pick(&candidates()).unwrap(), PickOutcome::Cancelled);
    }
}
