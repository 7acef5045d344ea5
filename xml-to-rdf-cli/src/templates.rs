pub enum Template {
    Basic,
    Full,
}

pub const BASIC_CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config>
  <!-- Prefixes usable in predicates, types and path expressions.
       owl, rdf and rdfs are always available. -->
  <namespaces>
    <namespace prefix="ex" uri="http://example.com/"/>
  </namespaces>

  <!-- One resource per matching input element. Paths are XPath 1.0; a
       default-namespaced input root is reachable through the vp prefix. -->
  <mapping match="/records/record">
    <resource>
      <!-- {path} placeholders are evaluated against the matched element -->
      <identifier value="http://example.com/record/{@id}"/>
      <type value="http://example.com/Record"/>
      <triple predicate="rdfs:label" value="{title}"/>
    </resource>
  </mapping>
</config>
"#;

pub const FULL_CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config>
  <namespaces>
    <namespace prefix="ex" uri="http://example.com/"/>
    <namespace prefix="xsd" uri="http://www.w3.org/2001/XMLSchema#"/>
  </namespaces>

  <!-- Used when processing with the split flag: chunk the input every
       500 top-level elements (or type="filesize" with size in kilobytes).
       Chunks go to inputchunks/ next to the input, output to outputchunks/. -->
  <split type="elementcount" size="500" inputdirectoryname="inputchunks" outputdirectoryname="outputchunks"/>

  <!-- Reusable fragments, referenced with <usenamedmapping name=".."/> -->
  <namedmapping name="address">
    <bnode predicate="ex:address" type="ex:Address">
      <triple predicate="ex:city" value="{address/city}"/>
      <triple predicate="ex:postcode" value="{address/postcode}" modifier="strtolower"/>
    </bnode>
  </namedmapping>

  <!-- Counters: ^counter_name~ reads the current value -->
  <counter name="row" initialValue="0"/>

  <!-- namedgraph puts everything emitted for each match into its own graph;
       the output switches to TriG unless N-Quads was chosen -->
  <mapping match="/records/record" namedgraph="http://example.com/graph/{@source}">
    <counter name="row" iterate="true"/>
    <uniqueidentifier name="batch" generate="true"/>
    <resource>
      <identifier value="http://example.com/record/{@id}"/>
      <type value="http://example.com/Record"/>
      <triple predicate="rdfs:label" value="{title}" language="en"/>
      <triple predicate="ex:position" value="^counter_row~" type="xsd:integer"/>
      <triple predicate="ex:batch" value="^uniqueidentifier_batch~"/>
      <triple predicate="ex:checksum" value="{title}" modifier="md5"/>
      <triple predicate="ex:related" object="{related/@ref}" prefix="http://example.com/record/"/>

      <if match="address">
        <usenamedmapping name="address"/>
      </if>
      <else>
        <triple predicate="rdfs:comment" value="No address"/>
      </else>

      <!-- cases stop the switch once matched unless they carry break -->
      <switch match="status">
        <case value="active">
          <type value="http://example.com/ActiveRecord"/>
        </case>
        <case match="@archived" break="true">
          <type value="http://example.com/ArchivedRecord"/>
        </case>
        <default>
          <triple predicate="ex:status" value="unknown"/>
        </default>
      </switch>
    </resource>

    <if match="not(@id)">
      <error message="record without an id" exit="false"/>
    </if>
  </mapping>
</config>
"#;
