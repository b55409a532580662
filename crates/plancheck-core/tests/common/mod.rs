//! Shared fixtures for plancheck-core integration tests.

#![allow(dead_code)]

use plancheck_core::{
    Beam, ControlPoint, DevicePosition, DeviceType, DoseReference, FractionGroup, Parameter,
    PlanRecord, ReferencedDoseReference, TruthTable,
};

/// The seventeen-case reference table used by the audit program.
pub const TRUTH_TABLE_CSV: &str = r#"case,mode req,prescription dose/#,prescription point,isocentre point,override,collimator,gantry,SSD,couch,field size,wedge,meas,energy
1,False,2/-/-,1 or 3,surf,bone,0,0,100,-,10x10,no wedge,"'1','3','10','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
2,False,2/-/-,5,3,no override,-,"270,0,90","86,93,86",-,"10x6,10x12,10x6","30,no wedge,30","'5_RLAT','8_RLAT','5_AP','8_AP','5_LLAT','8_LLAT','-','-','-'","6,6FFF,10,10FFF,18"
3,False,2/-/-,3,3,no override,-,90,86,-,10x12,no wedge,"'3','5','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
4,False,2/-/-,3,3,no override,-,90,86,-,10x12,60,"'3','5','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
5,False,50/25/-,chair,3,no override,0,0,93,-,-,no wedge,"'11','12','13','14','15','18','19','20','21'","6,6FFF,10,10FFF,18"
6,True,50/25/-,CShape,3,lungs,*0,"150,60,0,300,210","?,89,93,89,?",couch?,-,no wedge,"'11','12','13','14','15','16','17','-','-'","6,6FFF,10,10FFF,18"
7,True,50/25/-,CShape,3,no override,*0,"150,60,0,300,210","?,89,93,89,?",couch?,-,no wedge,"'11','12','13','14','15','16','17','-','-'","6,6FFF,10,10FFF,18"
8,True,50/25/-,C8Target,3,no override,*0,"150,60,0,300,210","?,89,93,89,?",couch?,-,no wedge,"'11','12','13','14','15','17','18','-','-'","6,6FFF,10,10FFF,18"
9,False,900/3/MU,-,SoftTiss,lungs,-,-,90,-,"3x3,2x2,1x1",no wedge,"'SoftTiss_3','SoftTiss_2','SoftTiss_1','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
10,True,45/3/-,SoftTissTarget,SoftTiss,lungs,-,-,-,couch?,-,no wedge,"'SoftTiss','-','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
11,True,24/2/-,SpineTarget,Spine,no override,-,-,-,couch?,-,no wedge,"'Spine2Inf','Spine1Sup','Cord','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
12,True,48/4/-,LungTarget,Lung,no override,-,-,-,couch?,-,no wedge,"'Lung','-','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
13,True,3/-/-,1,1,central cube,-,-,-,-,3x3,no wedge,"'1_3','4_3','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
14,True,3/-/-,1,1,central cube,-,-,-,-,1.5x1.5,no wedge,"'1_1.5','4_1.5','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
15,True,20/-/-,PTV_c14_c15,1,central cube,-,-,-,couch?,-,no wedge,"'1','3','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
16,True,20/-/-,-,-,central cube,-,-,-,couch?,-,no wedge,"'1','3','-','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
17,True,20/-/-,-,-,central cube,-,-,-,couch?,-,no wedge,"'1','2','3','-','-','-','-','-','-'","6,6FFF,10,10FFF,18"
"#;

pub fn reference_table() -> TruthTable {
    TruthTable::from_csv_reader(TRUTH_TABLE_CSV.as_bytes()).expect("reference table parses")
}

/// A one-case table: every cell `-` except the given overrides.
pub fn single_case_table(overrides: &[(Parameter, &str)]) -> TruthTable {
    let columns = Parameter::ALL.into_iter().map(|p| {
        let cell = overrides
            .iter()
            .find(|(q, _)| *q == p)
            .map(|(_, cell)| *cell)
            .unwrap_or("-");
        (p.column_name(), vec![cell])
    });
    TruthTable::from_named_columns(columns.chain(std::iter::once(("case", vec!["1"]))))
        .expect("valid table")
}

pub fn jaws(x_mm: f64, y_mm: f64) -> Vec<DevicePosition> {
    vec![
        DevicePosition {
            device_type: DeviceType::Asymx,
            positions: vec![-x_mm / 2.0, x_mm / 2.0],
        },
        DevicePosition {
            device_type: DeviceType::Asymy,
            positions: vec![-y_mm / 2.0, y_mm / 2.0],
        },
        DevicePosition {
            device_type: DeviceType::Mlcx,
            positions: vec![-5.0; 120],
        },
    ]
}

pub fn setup_beam() -> Beam {
    Beam {
        number: Some(99),
        description: "SETUP beam".to_string(),
        control_points: vec![ControlPoint {
            gantry_angle: Some(270.0),
            source_to_surface_distance: Some(1000.0),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// A static beam with two identical control points.
pub fn static_beam(number: u32, gantry: f64, ssd_mm: f64) -> Beam {
    let cp = ControlPoint {
        gantry_angle: Some(gantry),
        source_to_surface_distance: Some(ssd_mm),
        beam_limiting_device_angle: Some(10.0),
        nominal_beam_energy: Some(6.0),
        beam_limiting_device_positions: jaws(100.0, 100.0),
        ..Default::default()
    };
    Beam {
        number: Some(number),
        description: format!("Field {}", number),
        primary_dosimeter_unit: Some("MU".to_string()),
        control_points: vec![cp.clone(), cp],
        wedges: Vec::new(),
    }
}

/// Five-field IMRT plan with a leading setup beam; 50 Gy in 25 fractions.
pub fn imrt_plan() -> PlanRecord {
    PlanRecord {
        label: Some("imrt-5-field".to_string()),
        beams: vec![
            setup_beam(),
            static_beam(1, 150.0, 851.9),
            static_beam(2, 60.0, 894.2),
            static_beam(3, 0.0, 926.7),
            static_beam(4, 300.0, 895.7),
            static_beam(5, 210.0, 851.9),
        ],
        dose_references: vec![DoseReference {
            target_prescription_dose: Some(50.0),
        }],
        fraction_groups: vec![FractionGroup {
            number_of_fractions_planned: Some(25),
        }],
    }
}

/// Single arc sampled at the given `(gantry, dose point SSD mm)` pairs.
pub fn vmat_plan(samples: &[(f64, f64)]) -> PlanRecord {
    let control_points = samples
        .iter()
        .map(|(gantry, ssd_mm)| ControlPoint {
            gantry_angle: Some(*gantry),
            beam_limiting_device_angle: Some(355.0),
            nominal_beam_energy: Some(6.0),
            beam_limiting_device_positions: jaws(120.0, 150.0),
            referenced_dose_references: vec![
                ReferencedDoseReference {
                    beam_dose_point_ssd: Some(1000.0),
                },
                ReferencedDoseReference {
                    beam_dose_point_ssd: Some(*ssd_mm),
                },
            ],
            ..Default::default()
        })
        .collect();

    PlanRecord {
        label: Some("vmat-arc".to_string()),
        beams: vec![
            setup_beam(),
            Beam {
                number: Some(1),
                description: "Arc 1".to_string(),
                primary_dosimeter_unit: Some("MU".to_string()),
                control_points,
                wedges: Vec::new(),
            },
        ],
        dose_references: vec![DoseReference {
            target_prescription_dose: Some(50.0),
        }],
        fraction_groups: vec![FractionGroup {
            number_of_fractions_planned: Some(25),
        }],
    }
}
