// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{Clear, ClearType},
    execute,
};
use tokio::runtime::Runtime;

use deck_mixer::advisory::CompletionBackend;
use deck_mixer::console::{MixConsole, RawModeGuard};
use deck_mixer::loader::TrackLocation;
use deck_mixer::{Advisor, AudioRuntime, ChannelId, EngineConfig, Track, TrackLibrary};

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let rt = Runtime::new()?;
    let mut library = TrackLibrary::with_demo_tracks();
    let advisor = Arc::new(Advisor::from_env());

    // deck_mixer [URL_A] [URL_B]; demo tracks otherwise
    let args: Vec<String> = std::env::args().skip(1).collect();
    let demo = |id: &str| library.get(id).map(|t| t.url.clone()).unwrap_or_default();
    let url_a = args.first().cloned().unwrap_or_else(|| demo("2"));
    let url_b = args.get(1).cloned().unwrap_or_else(|| demo("3"));

    let runtime = AudioRuntime::new(EngineConfig::from_env())?;

    println!("💿 Loading decks...");
    let (res_a, res_b) = rt.block_on(async {
        tokio::join!(
            runtime.load_track(ChannelId::A, &url_a),
            runtime.load_track(ChannelId::B, &url_b)
        )
    });
    for (channel, res) in [(ChannelId::A, &res_a), (ChannelId::B, &res_b)] {
        if let Err(e) = res {
            eprintln!("❌ Deck {channel}: {e}");
        }
    }

    let mut decks: [Option<Track>; 2] = [None, None];
    for (channel, url, loaded) in [
        (ChannelId::A, &url_a, res_a.is_ok()),
        (ChannelId::B, &url_b, res_b.is_ok()),
    ] {
        if !loaded {
            continue;
        }
        decks[channel.index()] = match library.find_by_url(url) {
            Some(track) => Some(track.clone()),
            None => match TrackLocation::parse(url) {
                Ok(TrackLocation::Local(path)) => {
                    Some(rt.block_on(library.import_file(&path, &*advisor)).clone())
                }
                _ => None,
            },
        };
    }

    let mut console = MixConsole::new(runtime, library, advisor, rt.handle().clone());
    for channel in ChannelId::ALL {
        console.set_deck_track(channel, decks[channel.index()].take());
    }

    let terminal = RawModeGuard::enter()?;
    let result = run_loop(&mut console, &rt);
    let restored = terminal.release();
    console.runtime().shutdown();
    result?;
    restored?;

    println!("\n🛑 Exiting mixer.");
    Ok(())
}

fn run_loop<B: CompletionBackend + 'static>(console: &mut MixConsole<B>, rt: &Runtime) -> Result<(), anyhow::Error> {
    execute!(std::io::stdout(), Clear(ClearType::All))?;

    // 20 FPS
    let frame = Duration::from_millis(50);
    console.run_tick()?;

    loop {
        if event::poll(frame)? {
            if let Event::Key(ev) = event::read()? {
                if ev.kind == KeyEventKind::Press {
                    if console.should_quit(ev.code, ev.modifiers) {
                        return Ok(());
                    }
                    console.handle_key(ev.code);
                    if console.has_pending_load() {
                        // show "Loading..." before the decode blocks the loop
                        console.run_tick()?;
                        rt.block_on(console.process_pending());
                    }
                }
            }
        }
        console.run_tick()?;
    }
}
