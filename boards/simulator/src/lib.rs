#[macro_use]
extern crate log;
extern crate heli_flight;

pub mod mission;
pub mod peripherals;
pub mod plant;

use std::{cell::Cell, rc::Rc};

use hal::altitude::OneShotSource;
use heli_flight::{
    components::{
        buttons::{self, Buttons},
        rig::Rig,
    },
    config::Config,
    datastore::DataStore,
    drivers::pwm::PwmMotor,
    fcs::{out::Telemetry, Supervisor},
};

use peripherals::{Adc, AltitudePin, Delay, Halt, Panel, Timer};
use plant::{Plant, Signal};

pub struct Options {
    /// Mechanical yaw at power on, degrees
    pub start_yaw: u16,
}

impl Default for Options {
    fn default() -> Self {
        Self { start_yaw: 200 }
    }
}

type Rotor = PwmMotor<Timer>;

pub struct Simulator {
    rig: &'static Rig,
    datastore: &'static DataStore,
    supervisor: Supervisor<'static, Rotor, Rotor, &'static DataStore>,
    plant: Plant,
    sample: Rc<Cell<u16>>,
    source: OneShotSource<Adc, Adc, AltitudePin>,
    panel: Panel,
    halt: Halt,
    step_ms: u64,
    control_divider: u64,
    steps: u64,
}

impl Simulator {
    pub fn new(config: Config, options: Options) -> Result<Self, buttons::Error> {
        let mut panel = Panel::new();
        let plant = Plant::new(options.start_yaw);
        let buttons = Buttons::rig(&mut panel)?;
        let rig: &'static Rig = Box::leak(Box::new(Rig::new(buttons, plant.quadrature())));
        let datastore: &'static DataStore = Box::leak(Box::new(DataStore::default()));

        let sample = Rc::new(Cell::new(plant.sample()));
        let adc = Adc::new(sample.clone());
        let mut source: OneShotSource<Adc, _, _> = OneShotSource::new(adc, AltitudePin);
        let mut delay = Delay::default();
        let delay_us = config.timing.calibration_delay_us();
        let calibration = rig.altimeter.calibrate(&mut source, &mut delay, delay_us);
        info!("Boot calibration took {}ms: {:?}", delay.elapsed_us / 1000, calibration);
        datastore.write_calibration(calibration);

        let main = PwmMotor::new(Timer::new(), (), config.motors.main_duty);
        let tail = PwmMotor::new(Timer::new(), (), config.motors.tail_duty);
        let supervisor = Supervisor::new(rig, main, tail, datastore, config);

        let poll_rate = config.timing.poll_rate.raw();
        let control_rate = config.timing.control_rate.raw();
        Ok(Self {
            rig,
            datastore,
            supervisor,
            plant,
            sample,
            source,
            panel,
            halt: Halt,
            step_ms: 1000 / poll_rate as u64,
            control_divider: (poll_rate / control_rate).max(1) as u64,
            steps: 0,
        })
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.steps * self.step_ms
    }

    pub fn panel(&mut self) -> &mut Panel {
        &mut self.panel
    }

    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    pub fn datastore(&self) -> &DataStore {
        self.datastore
    }

    pub fn telemetry(&self) -> Option<Telemetry> {
        self.datastore.read_telemetry()
    }

    /// One poll period: plant, edges, altitude sample and inputs, and the
    /// control tick when due.
    pub fn step(&mut self) {
        use hal::motor::Motor;

        let main_duty = self.supervisor.main_motor().duty();
        let tail_duty = self.supervisor.tail_motor().duty();
        let rig = self.rig;
        let dt = self.step_ms as f32 / 1000.0;
        self.plant.advance(dt, main_duty, tail_duty, |signal| match signal {
            Signal::Edge(a, b) => {
                rig.on_yaw_edge(a, b);
            }
            Signal::Reference => rig.on_yaw_reference(),
        });
        self.sample.set(self.plant.sample());

        rig.poll(&mut self.source, &mut self.panel, &mut self.halt);
        if self.steps % self.control_divider == 0 {
            self.supervisor.tick();
        }
        self.steps += 1;
    }
}
