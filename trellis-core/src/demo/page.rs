//! The Page Component
//!
//! [`UseEffectDemo`] is the render function: six state cells, five effects,
//! and a [`PageModel`] snapshot as output. [`DemoPage`] mounts it and exposes
//! the buttons of the page as methods.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::counter::{self, CounterAction};
use super::lifecycle;
use super::profile;
use super::timer::{self, TimerAction, TimerState};
use super::window;
use crate::config::DemoConfig;
use crate::deps;
use crate::error::ViewError;
use crate::fetch::{FetchOutcome, FetchPhase, User, UserSource};
use crate::platform::{LogLevel, Platform, WindowSize};
use crate::reactive::{Component, Deps, EffectId, Scope, StateCell, View, ViewOptions};

/// What the page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageModel {
    pub count: i64,
    pub seconds: u64,
    pub timer: TimerState,
    pub user: Option<Rc<User>>,
    pub loading: bool,
    pub window: WindowSize,
}

impl PageModel {
    pub fn fetch_phase(&self) -> FetchPhase {
        FetchPhase::of(self.loading, self.user.is_some())
    }
}

impl fmt::Display for PageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "counter : {}", self.count)?;
        writeln!(f, "timer   : {}s ({})", self.seconds, self.timer)?;
        match (&self.user, self.loading) {
            (_, true) => writeln!(f, "user    : loading...")?,
            (Some(user), false) => writeln!(
                f,
                "user    : {} <{}>, phone {}, web {}",
                user.name, user.email, user.phone, user.website
            )?,
            (None, false) => writeln!(f, "user    : no data")?,
        }
        write!(f, "window  : {}", self.window)
    }
}

/// The state cells of a mounted page.
#[derive(Debug, Clone)]
pub struct PageCells {
    pub count: StateCell<i64>,
    pub seconds: StateCell<u64>,
    pub timer_running: StateCell<bool>,
    pub user: StateCell<Option<Rc<User>>>,
    pub loading: StateCell<bool>,
    pub window: StateCell<WindowSize>,
}

impl PageCells {
    /// Current values, which may be ahead of the last render inside a batch.
    pub fn model(&self) -> PageModel {
        PageModel {
            count: self.count.get(),
            seconds: self.seconds.get(),
            timer: TimerState::from_flag(self.timer_running.get()),
            user: self.user.get(),
            loading: self.loading.get(),
            window: self.window.get(),
        }
    }
}

/// IDs of the page's effects, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEffects {
    pub mount: EffectId,
    pub counter: EffectId,
    pub timer: EffectId,
    pub resize: EffectId,
    pub user: EffectId,
}

/// Output of one render.
#[derive(Debug, Clone)]
pub struct PageFrame {
    pub model: PageModel,
    pub cells: PageCells,
    pub effects: PageEffects,
}

/// The render function of the page.
pub struct UseEffectDemo {
    platform: Rc<dyn Platform>,
    config: DemoConfig,
}

impl UseEffectDemo {
    pub fn new(platform: Rc<dyn Platform>, config: DemoConfig) -> Self {
        Self { platform, config }
    }

    pub fn platform(&self) -> &Rc<dyn Platform> {
        &self.platform
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }
}

impl Component for UseEffectDemo {
    type Output = PageFrame;

    fn render(&self, cx: &mut Scope) -> PageFrame {
        let cells = PageCells {
            count: cx.use_state(|| 0),
            seconds: cx.use_state(|| 0),
            timer_running: cx.use_state(|| false),
            user: cx.use_state(|| None),
            loading: cx.use_state(|| false),
            window: cx.use_state(WindowSize::default),
        };
        let model = cells.model();
        let running = model.timer.is_running();

        let effects = PageEffects {
            mount: cx.use_effect(
                Deps::Once,
                lifecycle::mount_effect(self.platform.clone(), cells.window.clone()),
            ),
            counter: cx.use_effect(
                deps![model.count],
                counter::count_effect(self.platform.clone(), model.count, self.config.alert_every),
            ),
            timer: cx.use_effect(
                deps![running],
                timer::timer_effect(
                    self.platform.clone(),
                    running,
                    self.config.tick_interval(),
                    cells.seconds.clone(),
                ),
            ),
            resize: cx.use_effect(
                deps![],
                window::resize_effect(self.platform.clone(), cells.window.clone()),
            ),
            user: cx.use_effect(
                deps![model.user.clone()],
                profile::user_effect(self.platform.clone(), model.user.clone()),
            ),
        };

        PageFrame {
            model,
            cells,
            effects,
        }
    }
}

/// A mounted demo page.
///
/// Every button runs as one batch, so a click renders once no matter how
/// many cells it touches.
pub struct DemoPage {
    view: View<UseEffectDemo>,
    cells: PageCells,
    effects: PageEffects,
    source: Rc<dyn UserSource>,
}

impl DemoPage {
    /// Mount the page and run its first render and effects.
    pub fn mount(
        platform: Rc<dyn Platform>,
        source: Rc<dyn UserSource>,
        config: DemoConfig,
    ) -> Result<Self, ViewError> {
        let options = ViewOptions {
            max_render_passes: config.max_render_passes,
        };
        let view = View::mount_with(UseEffectDemo::new(platform, config), options)?;
        let frame = view.output().ok_or(ViewError::Failed)?;

        Ok(Self {
            view,
            cells: frame.cells,
            effects: frame.effects,
            source,
        })
    }

    pub fn view(&self) -> &View<UseEffectDemo> {
        &self.view
    }

    pub fn cells(&self) -> &PageCells {
        &self.cells
    }

    pub fn effects(&self) -> PageEffects {
        self.effects
    }

    /// What the last render showed.
    pub fn model(&self) -> Option<PageModel> {
        self.view.output().map(|frame| frame.model)
    }

    pub fn counter(&self, action: CounterAction) -> Result<(), ViewError> {
        self.view
            .dispatch(|| self.cells.count.update(|count| action.apply(*count)))
    }

    pub fn increment(&self) -> Result<(), ViewError> {
        self.counter(CounterAction::Increment)
    }

    pub fn decrement(&self) -> Result<(), ViewError> {
        self.counter(CounterAction::Decrement)
    }

    pub fn reset_counter(&self) -> Result<(), ViewError> {
        self.counter(CounterAction::Reset)
    }

    pub fn timer(&self, action: TimerAction) -> Result<(), ViewError> {
        let cells = &self.cells;
        self.view.dispatch(|| match action {
            TimerAction::Start => cells.timer_running.set(true),
            TimerAction::Stop => cells.timer_running.set(false),
            TimerAction::Toggle => cells.timer_running.update(|running| !running),
            TimerAction::Reset => {
                cells.seconds.set(0);
                cells.timer_running.set(false);
            }
        })
    }

    pub fn start_timer(&self) -> Result<(), ViewError> {
        self.timer(TimerAction::Start)
    }

    pub fn stop_timer(&self) -> Result<(), ViewError> {
        self.timer(TimerAction::Stop)
    }

    pub fn toggle_timer(&self) -> Result<(), ViewError> {
        self.timer(TimerAction::Toggle)
    }

    pub fn reset_timer(&self) -> Result<(), ViewError> {
        self.timer(TimerAction::Reset)
    }

    /// The fetch button.
    ///
    /// Clears the displayed user and raises the loading flag, awaits the
    /// source, then either shows the user or logs the failure. Either way the
    /// loading flag drops. Failures are not surfaced in the view.
    pub async fn fetch_user_data(&self) -> FetchOutcome {
        if self.cells.loading.get() {
            debug!("fetch already in flight");
            return FetchOutcome::Busy;
        }

        let started = self.view.dispatch(|| {
            self.cells.loading.set(true);
            self.cells.user.set(None);
        });
        if started.is_err() {
            return FetchOutcome::Discarded;
        }

        let result = self.source.fetch_user().await;

        if !self.view.is_mounted() {
            debug!("view gone before the fetch finished, discarding result");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(user) => {
                let user = Rc::new(user);
                let shown = self.view.dispatch(|| {
                    self.cells.user.set(Some(user.clone()));
                    self.cells.loading.set(false);
                });
                match shown {
                    Ok(()) => FetchOutcome::Loaded(user),
                    Err(_) => FetchOutcome::Discarded,
                }
            }
            Err(err) => {
                warn!(error = %err, "user fetch failed");
                self.platform()
                    .log(LogLevel::Error, &format!("failed to fetch user data: {err}"));
                if let Err(reset) = self.view.dispatch(|| self.cells.loading.set(false)) {
                    debug!(error = %reset, "could not clear the loading flag after a failed fetch");
                }
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Tear the page down. Calling it again is a no-op.
    pub fn unmount(&self) {
        self.view.unmount();
    }

    fn platform(&self) -> &Rc<dyn Platform> {
        self.view.component().platform()
    }
}

impl fmt::Debug for DemoPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoPage")
            .field("view", &self.view)
            .field("effects", &self.effects)
            .finish()
    }
}
