//! Plain-text front end over the services layer.

use std::io::Write;

use services::{
    AnswerOutcome, AppServices, DailyAnswerResult, DailyCompleteSignal, DailyState, PracticeService,
};
use svenska_core::model::{CategoryId, DifficultyBand, ExerciseItem, ExerciseType, UserId};
use svenska_core::rewards::{PracticeMode, RewardOutcome};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type AppResult = Result<(), Box<dyn std::error::Error>>;
type Input = Lines<BufReader<Stdin>>;

fn input() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

async fn prompt(input: &mut Input, label: &str) -> std::io::Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    input.next_line().await
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn print_program(state: &DailyState) {
    let progress = state.progress();
    println!(
        "Dagprogramma {} · {}/{} ({}%)",
        state.day(),
        progress.completed,
        progress.total,
        progress.percent()
    );
    for (index, item) in state.program().items().iter().enumerate() {
        let done = state.completion().contains(&item.composite_key());
        println!(
            "  [{}] {:>2}. {:<8} {:<16} {}",
            if done { "x" } else { " " },
            index + 1,
            item.exercise_type().as_str(),
            item.category_name(),
            item.prompt()
        );
    }
}

fn print_item(index: usize, total: usize, item: &ExerciseItem) {
    println!();
    println!("({}/{total}) {} · {}", index + 1, item.exercise_type(), item.category_name());
    match item {
        ExerciseItem::Phrase(phrase) if phrase.exercise_type == ExerciseType::Writing => {
            println!("  Schrijf in het Zweeds: {}", phrase.dutch);
        }
        ExerciseItem::Phrase(phrase) => {
            println!("  Zeg na: {}", phrase.swedish);
            if !phrase.pronunciation.is_empty() {
                println!("  Uitspraak: [{}]  ({})", phrase.pronunciation, phrase.dutch);
            }
        }
        ExerciseItem::Grammar(grammar) => {
            println!("  {} ({})", grammar.prompt, grammar.grammar_type);
        }
    }
}

fn print_reward(reward: &RewardOutcome) {
    println!("  +{} punten", reward.points_awarded);
    if reward.leveled_up() {
        println!("  Niveau {} bereikt!", reward.level_after);
    }
    for badge in &reward.new_badges {
        println!("  Nieuwe badge: {badge}");
    }
}

fn print_signal(signal: &DailyCompleteSignal) {
    println!();
    println!("*** Dagprogramma voltooid! ({}) ***", signal.day);
    for badge in &signal.new_badges {
        println!("  Nieuwe badge: {badge}");
    }
}

fn print_answer(result: &DailyAnswerResult) {
    match &result.outcome {
        AnswerOutcome::Retry { .. } => {
            println!("  Niet helemaal, probeer opnieuw (:skip om over te slaan).");
        }
        AnswerOutcome::Advanced { .. } | AnswerOutcome::DayComplete { .. } => {
            println!("  Goed zo!");
        }
    }
    if let Some(reward) = &result.reward {
        print_reward(reward);
    }
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

/// Work through today's program until it is done or the learner quits.
pub async fn today(services: &AppServices, user: UserId) -> AppResult {
    let daily = services.daily();
    let mut state = daily.open(user).await?;
    print_program(&state);
    println!("Typ je antwoord, :skip om over te slaan of :quit om te stoppen.");

    let mut input = input();
    loop {
        if let Some(signal) = daily.poll_signal(&mut state) {
            print_signal(signal);
            state.dismiss_signal();
        }

        let Some(index) = state.session().current_index() else {
            if state.session().is_day_complete() {
                println!("Je bent klaar voor vandaag. Kom morgen terug!");
            }
            break;
        };
        if let Some(item) = state.current_item() {
            print_item(index, state.program().len(), item);
        }

        let Some(line) = prompt(&mut input, "> ").await? else {
            state.leave();
            break;
        };
        match line.trim() {
            ":q" | ":quit" => {
                state.leave();
                break;
            }
            ":s" | ":skip" => {
                daily.skip(&mut state)?;
                continue;
            }
            _ => {}
        }

        // Crossing midnight mid-session switches to the new day's program.
        if daily.roll_over(&mut state).await? {
            println!("Een nieuwe dag! Hier is je nieuwe programma.");
            print_program(&state);
            continue;
        }

        let result = daily.answer(&mut state, &line).await?;
        print_answer(&result);
        if let Some(signal) = &result.signal {
            print_signal(signal);
            state.dismiss_signal();
        }
    }

    let progress = state.progress();
    println!("Voortgang: {}/{}", progress.completed, progress.total);
    Ok(())
}

/// Free practice round outside the daily program.
pub async fn practice(
    services: &AppServices,
    user: UserId,
    mode: PracticeMode,
    category: Option<&CategoryId>,
    rounds: usize,
) -> AppResult {
    let practice = services.practice();
    let mut profile = services.profiles().load_or_create(user).await?;
    let mut input = input();
    let mut correct = 0_usize;

    if mode == PracticeMode::Grammar {
        let mut pool = practice.grammar_pool(&profile)?;
        PracticeService::shuffle(&mut pool, &mut rand::rng());
        pool.truncate(rounds);
        for exercise in &pool {
            println!();
            println!("  {} ({})", exercise.prompt, exercise.grammar_type);
            let Some(line) = prompt(&mut input, "> ").await? else {
                break;
            };
            if PracticeService::check_grammar(exercise, &line) {
                correct += 1;
                print_reward(&practice.record_grammar(&mut profile).await?);
            } else {
                println!("  Het antwoord was: {}", exercise.answer);
            }
        }
    } else {
        let mut pool = practice.phrase_pool(&profile, category, mode)?;
        PracticeService::shuffle(&mut pool, &mut rand::rng());
        pool.truncate(rounds);
        for phrase in &pool {
            println!();
            let knew_it = match mode {
                PracticeMode::Flashcard => {
                    println!("  {}", phrase.dutch);
                    if prompt(&mut input, "  (enter om om te draaien) ").await?.is_none() {
                        break;
                    }
                    println!("  {}  [{}]", phrase.swedish, phrase.pronunciation);
                    let Some(answer) = prompt(&mut input, "  Wist je het? [j/n] ").await? else {
                        break;
                    };
                    matches!(answer.trim(), "j" | "ja" | "y" | "yes")
                }
                PracticeMode::Writing => {
                    println!("  Schrijf in het Zweeds: {}", phrase.dutch);
                    let Some(line) = prompt(&mut input, "> ").await? else {
                        break;
                    };
                    PracticeService::check_phrase(phrase, &line)
                }
                PracticeMode::Practice | PracticeMode::Grammar => {
                    println!("  Zeg na: {}  [{}]", phrase.swedish, phrase.pronunciation);
                    let Some(line) = prompt(&mut input, "> ").await? else {
                        break;
                    };
                    PracticeService::check_phrase(phrase, &line)
                }
            };
            if knew_it {
                correct += 1;
                print_reward(&practice.record_phrase(&mut profile, phrase, mode).await?);
            } else {
                println!("  Het antwoord was: {}", phrase.swedish);
            }
        }
    }

    println!();
    println!("{correct} goed · totaal {} punten, niveau {}", profile.total_points(), profile.level());
    Ok(())
}

pub async fn stats(services: &AppServices, user: UserId) -> AppResult {
    let profiles = services.profiles();
    let profile = profiles.load_or_create(user).await?;
    let overview = profiles.overview(&profile);

    println!("Leerling {}", overview.user_id);
    println!(
        "  Niveau {} · {} punten ({} tot het volgende niveau)",
        overview.level, overview.total_points, overview.points_to_next_level
    );
    println!("  Reeks: {} dagen · {} dagen voltooid", overview.streak, overview.completed_days);
    println!("  Zinnen geleerd: {}", overview.completed_phrases);
    if !overview.badges.is_empty() {
        let titles: Vec<&str> = overview.badges.iter().map(|b| b.title()).collect();
        println!("  Badges: {}", titles.join(", "));
    }
    println!("  Categorieën:");
    for category in &overview.categories {
        let enabled = if profile.is_category_enabled(&category.category_id) {
            ""
        } else {
            " (uit)"
        };
        println!(
            "    {:<16} {}/{} ({}%){enabled}",
            category.name,
            category.completed,
            category.total,
            category.percent()
        );
    }
    let preference = profile
        .difficulty_preference()
        .map_or("alles", DifficultyBand::as_str);
    println!("  Moeilijkheid: {preference}");
    Ok(())
}

pub async fn set_difficulty(
    services: &AppServices,
    user: UserId,
    preference: Option<DifficultyBand>,
) -> AppResult {
    let daily = services.daily();
    let mut state = daily.open(user).await?;
    if daily.change_difficulty_preference(&mut state, preference).await? {
        println!("Moeilijkheid aangepast; het dagprogramma is opnieuw samengesteld.");
    } else {
        println!("Moeilijkheid was al ingesteld.");
    }
    print_program(&state);
    Ok(())
}

pub async fn toggle(services: &AppServices, user: UserId, category: &CategoryId) -> AppResult {
    let daily = services.daily();
    let mut state = daily.open(user).await?;
    let enabled = daily.toggle_category(&mut state, category).await?;
    println!(
        "Categorie {category} staat nu {}.",
        if enabled { "aan" } else { "uit" }
    );
    print_program(&state);
    Ok(())
}

pub async fn reset(services: &AppServices, user: UserId) -> AppResult {
    let daily = services.daily();
    let mut state = daily.open(user).await?;
    daily.reset_today(&mut state).await;
    println!("Nieuw dagprogramma samengesteld.");
    print_program(&state);
    Ok(())
}
