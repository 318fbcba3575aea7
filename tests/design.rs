use std::{fs, path::PathBuf};

use kicad_fab::{
    generator::Generator, read_design_files, DesignError, Manufacturer, ParseError, Point, Rect,
    Side, SourceFile,
};

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("resources/test/demo")
        .join(file)
}

fn demo_design() -> kicad_fab::Design {
    read_design_files(demo("demo.net"), demo("demo.kicad_pcb")).unwrap()
}

#[test]
fn demo_board_is_reconciled() {
    let design = demo_design();

    assert_eq!(design.name, "demo");
    assert_eq!(design.date, "Sat 13 Oct 2018 18:02:11");
    assert_eq!(
        design.outline,
        Some(Rect {
            left: 100.0,
            top: 90.0,
            right: 125.0,
            bottom: 100.0,
        })
    );
    assert_eq!(design.references, vec!["C1", "C2", "R1", "J1"]);
    assert_eq!(
        design.descriptions.iter().collect::<Vec<_>>(),
        vec!["", "Capacitor 100nF 16V X7R", "Header 4 pins", "Resistor 10k 1%"]
    );

    let fiducials: Vec<_> = design
        .fiducials
        .iter()
        .map(|f| (f.reference.as_str(), f.position, f.side))
        .collect();
    assert_eq!(
        fiducials,
        vec![
            ("REF1T", Point { x: 101.0, y: 99.0 }, Side::Top),
            ("REF1B", Point { x: 124.0, y: 91.0 }, Side::Bottom),
        ]
    );

    let c2 = &design.components["C2"];
    assert_eq!(c2.side, Some(Side::Bottom));
    assert_eq!(c2.rotation, 180.0);
    assert_eq!(c2.distributor.part_number, "1759122");

    let j1 = &design.components["J1"];
    assert!(!j1.place);
    assert_eq!(j1.package, "PinHeader_1x04");

    let tp1 = &design.components["TP1"];
    assert_eq!(tp1.side, None);
    assert_eq!(tp1.position, Point::default());
    assert!(tp1.place);
}

#[test]
fn demo_bom() {
    let mut out = Vec::new();
    Generator::new(Manufacturer::Pcbpool)
        .write_bom(&demo_design(), &mut out)
        .unwrap();

    let expected = "\
Part;Value;Device;Package;Description;Description2;Quantity;Place;Provided;Distributor;Distributor Part Number;Distributor Link;Remarks;Unit Price;Total Price;Remarks Beta;Option1;Option2;Option3
C1, C2;100n;C_0603;0603;Capacitor 100nF 16V X7R;;2;True;No;Farnell;1759122;http://uk.farnell.com/1759122;;;;;;;
J1;;HDR4;PinHeader_1x04;Header 4 pins;;1;False;No;;;;;;;;;;
R1;10k;R_0603;0603;Resistor 10k 1%;;1;True;No;Farnell;2332016;http://uk.farnell.com/2332016;keep away from C1;;;;;;
";
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn demo_pickplace() {
    let mut out = Vec::new();
    Generator::new(Manufacturer::Pcbpool)
        .write_pickplace(&demo_design(), &mut out)
        .unwrap();

    let expected = "\
Filename:\tdemo.pickplace.txt

Position of PCB:
left under edge: X=0 / Y=0


name\tX-axis\tY-axis\tangle\tvalue\tpackage\tside

REF1T\t1.00\t1.00\t0.00\t1mm\tCircle\ttop
REF1B\t24.00\t9.00\t0.00\t1mm\tCircle\tbottom

C1\t10.00\t5.00\t90.00\t100n\t0603\ttop
C2\t20.00\t5.00\t180.00\t100n\t0603\tbottom
J1\t4.00\t9.00\t270.00\tConn_01x04\tPinHeader_1x04\ttop
R1\t15.50\t7.75\t0.00\t10k\t0603\ttop
";
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn files_are_written_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("fab");
    let design = demo_design();
    let generator = Generator::default();

    let bom = generator.process_bom(&output, &design).unwrap();
    let pickplace = generator.process_pickplace(&output, &design).unwrap();

    assert_eq!(bom.file_name().unwrap(), "demo.bom.csv");
    assert_eq!(pickplace.file_name().unwrap(), "demo.pickplace.txt");
    assert_eq!(fs::read_to_string(bom).unwrap().lines().count(), 4);
    assert!(fs::read_to_string(pickplace)
        .unwrap()
        .starts_with("Filename:\tdemo.pickplace.txt\n"));
}

#[test]
fn board_with_undeclared_module_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("blinky");
    fs::create_dir(&project).unwrap();

    let net = project.join("blinky.net");
    let pcb = project.join("blinky.kicad_pcb");
    fs::write(
        &net,
        "(export (design (date today)) (components (comp (ref D1) (value LED))))",
    )
    .unwrap();
    fs::write(
        &pcb,
        "(kicad_pcb (module LED (at 1 1) (fp_text reference D1 (layer F.SilkS))))",
    )
    .unwrap();
    assert_eq!(read_design_files(&net, &pcb).unwrap().name, "blinky");

    fs::write(
        &pcb,
        "(kicad_pcb (module LED (at 1 1) (fp_text reference D2 (layer F.SilkS))))",
    )
    .unwrap();
    let err = read_design_files(&net, &pcb).unwrap_err();
    assert_eq!(err.source_file(), Some(SourceFile::Pcb));
    assert!(matches!(
        err,
        DesignError::Parse {
            source: ParseError::UnknownReference { ref reference, .. },
            ..
        } if reference == "D2"
    ));
}
