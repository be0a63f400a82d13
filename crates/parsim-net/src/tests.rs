//! Unit tests for network parsing and border discovery.

use std::path::Path;

use crate::NetFile;

fn parse(xml: &str) -> NetFile {
    NetFile::parse(xml, Path::new("test.net.xml")).expect("fixture parses")
}

#[cfg(test)]
mod netfile {
    use std::path::Path;

    use crate::{NetError, NetFile};

    use super::parse;

    const NET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<net version="1.9">
    <location convBoundary="0.00,0.00,200.00,100.00"/>
    <edge id=":junction_c_0" function="internal">
        <lane id=":junction_c_0_0" length="4.00"/>
    </edge>
    <edge id="main_east" from="junction_w" to="junction_c">
        <lane id="main_east_0" length="100.00"/>
        <lane id="main_east_1" length="100.00"/>
    </edge>
    <junction id="junction_w" type="dead_end"/>
    <junction id="junction_c" type="priority"/>
</net>
"#;

    #[test]
    fn edges_and_lanes_parsed() {
        let net = parse(NET);
        let edge = net.edge("main_east").expect("edge present");
        assert_eq!(edge.lanes, vec!["main_east_0", "main_east_1"]);
        assert_eq!(edge.from_junction.as_deref(), Some("junction_w"));
        assert!(!edge.is_internal());
    }

    #[test]
    fn internal_edges_flagged() {
        let net = parse(NET);
        assert!(net.edge(":junction_c_0").expect("present").is_internal());
    }

    #[test]
    fn junction_types_resolved() {
        let net = parse(NET);
        assert!(net.is_dead_end("junction_w"));
        assert!(!net.is_dead_end("junction_c"));
        assert!(!net.is_dead_end("no_such_junction"));
    }

    #[test]
    fn missing_net_element_rejected() {
        let result = NetFile::parse("<routes/>", Path::new("bad.xml"));
        assert!(matches!(
            result,
            Err(NetError::MissingElement { element: "net", .. })
        ));
    }

    #[test]
    fn edge_without_id_rejected() {
        let xml = r#"<net><edge from="a"/></net>"#;
        let result = NetFile::parse(xml, Path::new("bad.xml"));
        assert!(matches!(
            result,
            Err(NetError::MissingAttribute { attribute: "id", .. })
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("part0.net.xml");
        std::fs::write(&path, NET).unwrap();
        let net = NetFile::load(&path).unwrap();
        assert!(net.edge("main_east").is_some());
    }
}

#[cfg(test)]
mod border {
    use parsim_core::PartitionId;

    use crate::{find_border_edges, PartitionBorders};

    use super::parse;

    /// Wrap edge/junction XML in a `<net>` root and parse it.
    fn net(edges: &str) -> crate::NetFile {
        parse(&format!("<net>{edges}</net>"))
    }

    /// Partition pair sharing `shared_out`: the edge leaves partition 0's
    /// interior (origin junction is a real junction in p0, a dead end in p1).
    fn crossing_pair() -> Vec<crate::NetFile> {
        let p0 = net(r#"
            <edge id="inner_w" from="j_far">
                <lane id="inner_w_0"/>
            </edge>
            <edge id="shared_out" from="j_mid">
                <lane id="shared_out_0"/>
            </edge>
            <junction id="j_far" type="dead_end"/>
            <junction id="j_mid" type="priority"/>
        "#);
        let p1 = net(r#"
            <edge id="shared_out" from="j_mid">
                <lane id="shared_out_0"/>
            </edge>
            <edge id="inner_e" from="j_east">
                <lane id="inner_e_0"/>
            </edge>
            <junction id="j_mid" type="dead_end"/>
            <junction id="j_east" type="priority"/>
        "#);
        vec![p0, p1]
    }

    #[test]
    fn shared_edge_becomes_one_border_edge() {
        let borders = find_border_edges(&crossing_pair());
        assert_eq!(borders.len(), 1);
        let edge = &borders[0];
        assert_eq!(edge.id, "shared_out");
        assert_eq!(edge.lanes, vec!["shared_out_0"]);
        assert_eq!(edge.from, PartitionId(0));
        assert_eq!(edge.to, PartitionId(1));
        assert_ne!(edge.from, edge.to);
    }

    #[test]
    fn dead_end_origin_reverses_direction() {
        // In partition 0's net the shared edge starts at a dead end: the cut
        // severed its upstream side, so traffic originates in partition 1.
        let p0 = net(r#"
            <edge id="shared_in" from="j_cut">
                <lane id="shared_in_0"/>
            </edge>
            <junction id="j_cut" type="dead_end"/>
        "#);
        let p1 = net(r#"
            <edge id="shared_in" from="j_src">
                <lane id="shared_in_0"/>
            </edge>
            <junction id="j_src" type="priority"/>
        "#);
        let borders = find_border_edges(&[p0, p1]);
        assert_eq!(borders.len(), 1);
        assert_eq!(borders[0].from, PartitionId(1));
        assert_eq!(borders[0].to, PartitionId(0));
    }

    #[test]
    fn interior_edges_ignored() {
        let p0 = net(r#"<edge id="only_here"><lane id="only_here_0"/></edge>"#);
        let p1 = net(r#"<edge id="only_there"><lane id="only_there_0"/></edge>"#);
        assert!(find_border_edges(&[p0, p1]).is_empty());
    }

    #[test]
    fn internal_function_edges_ignored() {
        let shared_internal =
            r#"<edge id=":x_0" function="internal"><lane id=":x_0_0"/></edge>"#;
        let p0 = net(shared_internal);
        let p1 = net(shared_internal);
        assert!(find_border_edges(&[p0, p1]).is_empty());
    }

    #[test]
    fn three_way_edges_dropped() {
        let shared = r#"<edge id="corner" from="j"><lane id="corner_0"/></edge>
                        <junction id="j" type="priority"/>"#;
        let nets = vec![net(shared), net(shared), net(shared)];
        assert!(find_border_edges(&nets).is_empty());
    }

    #[test]
    fn output_sorted_by_edge_id() {
        let p0 = net(r#"
            <edge id="zz" from="j"><lane id="zz_0"/></edge>
            <edge id="aa" from="j"><lane id="aa_0"/></edge>
            <junction id="j" type="priority"/>
        "#);
        let p1 = net(r#"
            <edge id="zz" from="j2"><lane id="zz_0"/></edge>
            <edge id="aa" from="j2"><lane id="aa_0"/></edge>
            <junction id="j2" type="dead_end"/>
        "#);
        let borders = find_border_edges(&[p0, p1]);
        let ids: Vec<&str> = borders.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["aa", "zz"]);
    }

    #[test]
    fn assignment_splits_by_direction() {
        let borders = find_border_edges(&crossing_pair());
        let per_partition = PartitionBorders::assign(2, &borders);

        // shared_out flows 0 → 1.
        assert_eq!(per_partition[0].from_edges.len(), 1);
        assert!(per_partition[0].to_edges.is_empty());
        assert_eq!(per_partition[1].to_edges.len(), 1);
        assert!(per_partition[1].from_edges.is_empty());
        assert_eq!(per_partition[0].from_edges[0].id, "shared_out");
        assert_eq!(per_partition[1].to_edges[0].id, "shared_out");
    }
}
