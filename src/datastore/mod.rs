//! Latest-value bulletin written by handlers and read by the advisory loop.

use concat_idents::concat_idents;
use hal::telemetry::Sink;

use crate::{components::altimeter::Calibration, fcs::out::Telemetry, sync::ReadSpinLock};

macro_rules! datastore {
    ($($names:ident: $types:ty),+) => {
        #[derive(Default)]
        pub struct DataStore {
            $($names: ReadSpinLock<Option<$types>>),+
        }

        impl DataStore {
            $(
                concat_idents!(getter = read_, $names {
                    pub fn getter(&self) -> Option<$types> {
                        self.$names.read()
                    }
                });

                concat_idents!(getter = $names, _version {
                    /// Number of completed writes
                    pub fn getter(&self) -> u32 {
                        self.$names.version()
                    }
                });

                concat_idents!(setter = write_, $names {
                    pub fn setter(&self, data: $types) {
                        if self.$names.write(Some(data)).is_err() {
                            error!("Write {} conflict", core::any::type_name::<$types>())
                        }
                    }
                });
            )+
        }
    }
}

datastore! {
    calibration: Calibration,
    telemetry: Telemetry
}

impl Sink<Telemetry> for &DataStore {
    fn publish(&mut self, telemetry: Telemetry) {
        self.write_telemetry(telemetry)
    }
}

mod test {
    #[test]
    fn test_datastore() {
        use hal::telemetry::Sink;

        use super::DataStore;
        use crate::{components::altimeter::Calibration, fcs::out::Telemetry, fcs::State};

        let datastore = DataStore::default();
        assert_eq!(datastore.read_telemetry(), None);
        assert_eq!(datastore.telemetry_version(), 0);

        let telemetry = Telemetry {
            altitude: 0,
            target_altitude: 10,
            yaw: 0,
            target_yaw: 0,
            main_duty: 0,
            tail_duty: 0,
            state: State::Idle,
        };
        let mut sink = &datastore;
        sink.publish(telemetry);
        assert_eq!(datastore.read_telemetry(), Some(telemetry));
        assert_eq!(datastore.telemetry_version(), 1);

        datastore.write_calibration(Calibration::from_ground(3000));
        assert_eq!(datastore.read_calibration().map(|c| c.high()), Some(2008));
    }
}
