use std::io::Write;

use quiz_core::grading::accuracy_percent;
use quiz_core::model::{Hint, Question, QuestionKind};
use quiz_core::quiz::{Advance, QuizSession};
use quiz_core::sound::{SoundCue, SoundPlayer};
use rand::Rng;
use services::{
    AppServicesError, CancelToken, QuizServices, ResultStep, SessionError, cancel_pair,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Prints sound cues as text.
pub struct TerminalPlayer;

impl SoundPlayer for TerminalPlayer {
    fn play(&self, cue: SoundCue) {
        let line = match cue {
            SoundCue::Success => "♪ ding",
            SoundCue::Wrong => "♪ buzz",
            SoundCue::Bonus => "♪ power-up! +1 life",
        };
        println!("{line}");
    }
}

enum Input {
    Answer(String),
    Hint,
    Quit,
}

/// Map a typed line to an answer for `question`. Choice questions take 1-based
/// option numbers; anything else is taken as typed.
fn interpret(question: &Question, line: &str) -> Input {
    let line = line.trim();
    match line {
        "?" => return Input::Hint,
        ":q" | ":quit" => return Input::Quit,
        _ => {}
    }
    if let Some(options) = question.options() {
        if let Some(option) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i))
        {
            return Input::Answer(option.clone());
        }
    }
    Input::Answer(line.to_owned())
}

fn render_question(session: &QuizSession, question: &Question) {
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{}   lives {}   score {}   streak {}   hints {}",
        progress.current_number,
        progress.total,
        "♥".repeat(usize::try_from(progress.lives).unwrap_or(0)),
        progress.score,
        progress.streak,
        progress.hints_remaining,
    );
    let word = question.word();
    match question.kind() {
        QuestionKind::Choice => {
            println!("What does \"{}\" mean?", word.headword());
            for (i, option) in question.options().unwrap_or_default().iter().enumerate() {
                println!("  {}. {option}", i + 1);
            }
        }
        QuestionKind::Typed => println!("Type the meaning of \"{}\":", word.headword()),
        QuestionKind::Audio => println!(
            "Listen: [{}]  Type the meaning:",
            word.audio_key().unwrap_or(word.headword())
        ),
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn render_hint(hint: Hint) {
    match hint {
        Hint::StartsWith(first) => println!("Hint: starts with \"{first}\""),
        Hint::HeadwordLength(len) => println!("Hint: the word has {len} letters"),
    }
}

/// Storage failures leave the question on screen, so they are reported and the
/// player answers again. Anything else ends the quiz.
fn recover_answer_error(err: SessionError) -> Result<String, SessionError> {
    match err {
        SessionError::Storage(err) => Ok(format!("Could not save that answer ({err}). Try again.")),
        other => Err(other),
    }
}

async fn read_input(
    lines: &mut Lines<BufReader<Stdin>>,
    cancel: &CancelToken,
) -> std::io::Result<Option<String>> {
    tokio::select! {
        line = lines.next_line() => line,
        () = cancel.cancelled() => Ok(None),
    }
}

/// Play one quiz on stdin/stdout. Ctrl-C abandons it.
pub async fn run_quiz<R: Rng + ?Sized>(
    services: &QuizServices,
    rng: &mut R,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = services.quiz_loop();
    let mut session = quiz.start_quiz(rng).await?;

    let (handle, token) = cancel_pair();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let completed = loop {
        let Some(question) = session.current_question().cloned() else {
            break session.is_complete();
        };
        render_question(&session, &question);

        let Some(line) = read_input(&mut lines, &token).await? else {
            break false;
        };
        let answer = match interpret(&question, &line) {
            Input::Quit => break false,
            Input::Hint => {
                match quiz.use_hint(&mut session) {
                    Ok(hint) => render_hint(hint),
                    Err(err) => println!("{err}"),
                }
                continue;
            }
            Input::Answer(answer) => answer,
        };

        let outcome = match quiz.answer_current(&mut session, &answer).await {
            Ok(outcome) => outcome,
            Err(err) => {
                println!("{}", recover_answer_error(err)?);
                continue;
            }
        };
        if outcome.was_correct {
            println!("Correct!");
        } else {
            println!("Not quite. The answer was: {}", outcome.correct_answer);
        }

        match quiz.await_result(&mut session, &token).await? {
            ResultStep::Advanced(Advance::Next { .. }) => {}
            ResultStep::Advanced(Advance::Completed(_)) => break true,
            ResultStep::Cancelled => break false,
        }
    };
    interrupt.abort();

    if !completed {
        quiz.abandon(&mut session);
        println!();
        println!("Quiz abandoned. Nothing was scored.");
        return Ok(());
    }

    let outcome = quiz.finish(&session).await?;
    let report = outcome.report;
    let accuracy = accuracy_percent(report.correct_answers(), report.total_questions())?;
    println!();
    println!("──────── Results ────────");
    println!("Grade      {}  {}", outcome.grade.letter.as_str(), outcome.grade.message);
    println!("Score      {}/{}", report.score(), report.total_questions());
    println!("Accuracy   {accuracy}%");
    println!("Max streak {}", report.max_streak());
    println!("Time       {}s", report.time_spent_seconds());
    if outcome.is_new_high_score {
        println!("New high score!");
    } else {
        println!("High score {}", outcome.high_score);
    }
    Ok(())
}

/// Print the high score and per-word counters.
pub async fn print_stats(services: &QuizServices) -> Result<(), AppServicesError> {
    let stats = services.stats().await?;
    println!("High score: {}", stats.high_score);
    println!("Words: {} ({} practised)", stats.word_count, stats.words.len());
    for entry in &stats.words {
        println!(
            "  {:<16} {:>3} right  {:>3} wrong",
            entry.headword, entry.correct_count, entry.wrong_count
        );
    }
    Ok(())
}
